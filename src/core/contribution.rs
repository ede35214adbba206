//! Contribution business logic - fee categories and their binding to grade
//! levels per school year.

use crate::{
    core::{ledger, money, school_year, student},
    entities::{Contribution, SchoolYearContribution, contribution, school_year_contribution},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Creates a contribution.
///
/// # Errors
/// - Empty name
/// - Negative amount
pub async fn create_contribution(
    db: &DatabaseConnection,
    name: &str,
    description: Option<String>,
    amount: Decimal,
    mandatory: bool,
) -> Result<contribution::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Contribution name cannot be empty".to_string(),
        });
    }
    let amount = money::require_non_negative(amount)?;

    let created = contribution::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description),
        amount: Set(amount),
        mandatory: Set(mandatory),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(
        "Created {} contribution {} ({}) at {}",
        if mandatory { "mandatory" } else { "optional" },
        created.id,
        created.name,
        created.amount
    );
    Ok(created)
}

/// Retrieves a contribution by id.
pub async fn get_contribution_by_id<C>(
    db: &C,
    contribution_id: i64,
) -> Result<Option<contribution::Model>>
where
    C: ConnectionTrait,
{
    Contribution::find_by_id(contribution_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a contribution by exact name.
pub async fn get_contribution_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<contribution::Model>> {
    Contribution::find()
        .filter(contribution::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all contributions ordered by id.
pub async fn get_all_contributions<C>(db: &C) -> Result<Vec<contribution::Model>>
where
    C: ConnectionTrait,
{
    Contribution::find()
        .order_by_asc(contribution::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Binds a contribution to a grade level for a school year.
///
/// Assigning the same `(school year, grade level, contribution)` twice returns
/// the existing binding unchanged. A new binding for the active school year
/// refreshes the cached balances of that grade's students in the same
/// transaction.
///
/// # Errors
/// - Unknown contribution
/// - Negative `total_amount`
pub async fn assign_contribution(
    db: &DatabaseConnection,
    school_year_id: i64,
    grade_level_id: i64,
    contribution_id: i64,
    total_amount: Option<Decimal>,
) -> Result<school_year_contribution::Model> {
    let total_amount = total_amount.map(money::require_non_negative).transpose()?;

    let txn = db.begin().await?;

    if get_contribution_by_id(&txn, contribution_id).await?.is_none() {
        return Err(Error::ContributionNotFound {
            id: contribution_id,
        });
    }

    let existing = SchoolYearContribution::find()
        .filter(school_year_contribution::Column::SchoolYearId.eq(school_year_id))
        .filter(school_year_contribution::Column::GradeLevelId.eq(grade_level_id))
        .filter(school_year_contribution::Column::ContributionId.eq(contribution_id))
        .one(&txn)
        .await?;
    if let Some(binding) = existing {
        tracing::debug!(
            "Contribution {contribution_id} already assigned to grade {grade_level_id} for year {school_year_id}"
        );
        return Ok(binding);
    }

    let binding = school_year_contribution::ActiveModel {
        school_year_id: Set(school_year_id),
        grade_level_id: Set(grade_level_id),
        contribution_id: Set(contribution_id),
        total_amount: Set(total_amount),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if school_year::get_active_school_year_id(&txn).await? == Some(school_year_id) {
        for s in student::get_students_in_grade(&txn, grade_level_id).await? {
            ledger::refresh_student_balance(&txn, s.id).await?;
        }
    }

    txn.commit().await?;
    Ok(binding)
}

/// All bindings of one school year.
pub async fn get_bindings_for_year<C>(
    db: &C,
    school_year_id: i64,
) -> Result<Vec<school_year_contribution::Model>>
where
    C: ConnectionTrait,
{
    SchoolYearContribution::find()
        .filter(school_year_contribution::Column::SchoolYearId.eq(school_year_id))
        .order_by_asc(school_year_contribution::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Contributions bound to a grade level for a school year, with their bindings.
pub async fn get_contributions_for_grade(
    db: &DatabaseConnection,
    school_year_id: i64,
    grade_level_id: i64,
) -> Result<Vec<(school_year_contribution::Model, contribution::Model)>> {
    let rows = SchoolYearContribution::find()
        .filter(school_year_contribution::Column::SchoolYearId.eq(school_year_id))
        .filter(school_year_contribution::Column::GradeLevelId.eq(grade_level_id))
        .order_by_asc(school_year_contribution::Column::ContributionId)
        .find_also_related(Contribution)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(binding, contribution)| contribution.map(|c| (binding, c)))
        .collect())
}
