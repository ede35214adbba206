//! Section entity - a class within a grade level (e.g. "Grade 7 - Rizal").

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Section database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sections")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Grade level this section belongs to
    pub grade_level_id: i64,
    /// Section name, unique within its grade level
    pub name: String,
}

/// Defines relationships between Section and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each section belongs to one grade level
    #[sea_orm(
        belongs_to = "super::grade_level::Entity",
        from = "Column::GradeLevelId",
        to = "super::grade_level::Column::Id"
    )]
    GradeLevel,
}

impl Related<super::grade_level::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GradeLevel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
