//! Donation entity - cash or in-kind gifts to the school fund.
//!
//! `donation_type` is stored as `"cash"` or `"in-kind"`; see
//! `core::donation::DonationType`. For in-kind gifts `donation_amount` is the
//! assessed value and the quantity columns track how the items were used.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Donation database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "donations")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the donor as given
    pub donor_name: String,
    /// `"cash"` or `"in-kind"`
    pub donation_type: String,
    /// Cash value, or assessed value for in-kind gifts
    pub donation_amount: Decimal,
    /// What was donated (in-kind only)
    pub item_description: Option<String>,
    /// Number of items donated (in-kind only)
    pub donation_quantity: i32,
    /// Items already consumed
    pub used_quantity: i32,
    /// Items received damaged
    pub damaged_quantity: i32,
    /// Items that cannot be used for another reason
    pub unusable_quantity: i32,
    /// Items available for use
    pub usable_quantity: i32,
    /// `"unused"`, `"partially-used"` or `"fully-used"`
    pub usage_status: String,
    /// School year the donation was received in
    pub school_year_id: Option<i64>,
    /// When the donation was received
    pub received_at: DateTimeUtc,
}

/// Donations have no navigated relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
