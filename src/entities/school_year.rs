//! School year entity (e.g. "2024-2025").

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// School year database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "school_years")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across school years
    pub name: String,
    /// First day of the school year
    pub starts_on: Date,
    /// Last day of the school year
    pub ends_on: Date,
}

/// School years have no navigated relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
