//! Contribution entity - a fee category such as "PTA Fee".
//!
//! The base `amount` can be overridden per school year and grade level through
//! `school_year_contribution::Model::total_amount`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Contribution database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contributions")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across contributions
    pub name: String,
    /// Free-form description shown to guardians
    pub description: Option<String>,
    /// Base amount owed per student
    pub amount: Decimal,
    /// Mandatory contributions apply to every child of a guardian
    pub mandatory: bool,
}

/// Defines relationships between Contribution and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One contribution is bound to many school years / grade levels
    #[sea_orm(has_many = "super::school_year_contribution::Entity")]
    SchoolYearContributions,
    /// One contribution receives many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::school_year_contribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolYearContributions.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
