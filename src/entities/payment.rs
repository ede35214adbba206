//! Payment entity - money a guardian paid toward one student's contribution.
//!
//! Payments are immutable once recorded. `school_year_id` is nullable only for
//! legacy rows; those never count toward any school year's balance.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student the payment is for
    pub student_id: i64,
    /// Contribution the payment is applied to
    pub contribution_id: i64,
    /// School year of the obligation, `None` for legacy rows
    pub school_year_id: Option<i64>,
    /// Amount paid
    pub amount_paid: Decimal,
    /// Official receipt number, if one was issued
    pub receipt_number: Option<String>,
    /// When the payment was received
    pub paid_at: DateTimeUtc,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    /// Each payment is applied to one contribution
    #[sea_orm(
        belongs_to = "super::contribution::Entity",
        from = "Column::ContributionId",
        to = "super::contribution::Column::Id"
    )]
    Contribution,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::contribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contribution.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
