//! Student entity.
//!
//! A student belongs to exactly one guardian, and its grade level decides which
//! contribution set applies. `enrollment_order` is the persisted tie-break that
//! decides which of a guardian's students is the first child.
//!
//! `balance` (carry-over from prior years) and `contribution_balance` (current
//! year outstanding) are caches. They are only written by the payment, refresh
//! and rollover paths in `core`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning guardian
    pub guardian_id: i64,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Current grade level
    pub grade_level_id: i64,
    /// Current section
    pub section_id: i64,
    /// 1-based registration position among the guardian's students
    pub enrollment_order: i32,
    /// Unpaid amount carried over from prior school years
    pub balance: Decimal,
    /// Outstanding amount for the active school year
    pub contribution_balance: Decimal,
    /// When the student was registered
    pub created_at: DateTimeUtc,
}

impl Model {
    /// "First Last" display name
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Defines relationships between Student and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each student belongs to one guardian
    #[sea_orm(
        belongs_to = "super::guardian::Entity",
        from = "Column::GuardianId",
        to = "super::guardian::Column::Id"
    )]
    Guardian,
    /// One student has many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::guardian::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Guardian.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
