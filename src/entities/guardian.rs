//! Guardian entity - the parent or guardian who owns one or more students.
//!
//! Discount rules are decided per guardian: only the guardian's first
//! student (see `student::Model::enrollment_order`) owes optional contributions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Guardian database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "guardians")]
pub struct Model {
    /// Unique identifier for the guardian
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name of the guardian
    pub name: String,
    /// Contact email, used by the guardian portal
    pub email: Option<String>,
    /// Optional phone number
    pub contact_number: Option<String>,
    /// When the guardian was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Guardian and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One guardian has many students
    #[sea_orm(has_many = "super::student::Entity")]
    Students,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
