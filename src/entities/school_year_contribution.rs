//! Binding of a contribution to a grade level for one school year.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// School year contribution database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "school_year_contributions")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// School year the binding applies to
    pub school_year_id: i64,
    /// Grade level the binding applies to
    pub grade_level_id: i64,
    /// Bound contribution
    pub contribution_id: i64,
    /// Replaces the contribution's base amount for this year when set
    pub total_amount: Option<Decimal>,
}

/// Defines relationships between `SchoolYearContribution` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each binding refers to one contribution
    #[sea_orm(
        belongs_to = "super::contribution::Entity",
        from = "Column::ContributionId",
        to = "super::contribution::Column::Id"
    )]
    Contribution,
}

impl Related<super::contribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contribution.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
