//! Expense entity - money spent out of the school fund.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Amount spent
    pub amount: Decimal,
    /// Free-form category (e.g. "supplies", "repairs")
    pub expense_type: String,
    /// Contribution that funded the expense, if any
    pub contribution_id: Option<i64>,
    /// In-kind donation consumed by the expense, if any
    pub donation_id: Option<i64>,
    /// What the money was spent on
    pub description: String,
    /// School year the expense belongs to
    pub school_year_id: Option<i64>,
    /// When the expense was incurred
    pub spent_at: DateTimeUtc,
}

/// Expenses have no navigated relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
