//! Funds history entity - the append-only ledger of the school fund.
//!
//! Each row carries either a `payment_id`, a `donation_id`, or neither (an
//! expense), plus the fund balance before and after the entry. Snapshots may be
//! missing on imported rows; `core::history` reconstructs them for display.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Funds history database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "funds_history")]
pub struct Model {
    /// Unique identifier, ascending in write order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Entry amount, always positive
    pub amount: Decimal,
    /// Fund balance before the entry
    pub balance_before: Option<Decimal>,
    /// Fund balance after the entry
    pub balance_after: Option<Decimal>,
    /// Source payment, if this entry records a payment
    pub payment_id: Option<i64>,
    /// Source donation, if this entry records a donation
    pub donation_id: Option<i64>,
    /// Human readable description for the history view
    pub description: String,
    /// When the entry was written
    pub created_at: DateTimeUtc,
}

/// Funds history rows have no navigated relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
