//! Grade level entity (e.g. "Grade 7"). Contributions are assigned per grade level.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Grade level database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grade_levels")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across grade levels
    pub name: String,
}

/// Grade levels have no navigated relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
