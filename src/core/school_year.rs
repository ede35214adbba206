//! School structure - grade levels, sections, school years, and which school
//! year is active.
//!
//! The active school year is stored in the `system_state` table under
//! [`ACTIVE_SCHOOL_YEAR_KEY`].

use crate::{
    entities::{
        GradeLevel, SchoolYear, Section, SystemState, grade_level, school_year, section,
        system_state,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};

/// `system_state` key holding the active school year id
pub const ACTIVE_SCHOOL_YEAR_KEY: &str = "active_school_year_id";

fn require_name(name: &str, what: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Config {
            message: format!("{what} name cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

/// Creates a grade level.
pub async fn create_grade_level(db: &DatabaseConnection, name: &str) -> Result<grade_level::Model> {
    let name = require_name(name, "Grade level")?;
    grade_level::ActiveModel {
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds a grade level by exact name.
pub async fn get_grade_level_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<grade_level::Model>> {
    GradeLevel::find()
        .filter(grade_level::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all grade levels ordered by id.
pub async fn get_all_grade_levels(db: &DatabaseConnection) -> Result<Vec<grade_level::Model>> {
    GradeLevel::find()
        .order_by_asc(grade_level::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a section under an existing grade level.
pub async fn create_section(
    db: &DatabaseConnection,
    grade_level_id: i64,
    name: &str,
) -> Result<section::Model> {
    let name = require_name(name, "Section")?;
    if GradeLevel::find_by_id(grade_level_id).one(db).await?.is_none() {
        return Err(Error::Config {
            message: format!("Grade level {grade_level_id} does not exist"),
        });
    }
    section::ActiveModel {
        grade_level_id: Set(grade_level_id),
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds a section of a grade level by name.
pub async fn get_section_by_name(
    db: &DatabaseConnection,
    grade_level_id: i64,
    name: &str,
) -> Result<Option<section::Model>> {
    Section::find()
        .filter(section::Column::GradeLevelId.eq(grade_level_id))
        .filter(section::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all sections ordered by id.
pub async fn get_all_sections(db: &DatabaseConnection) -> Result<Vec<section::Model>> {
    Section::find()
        .order_by_asc(section::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a school year. `ends_on` must not precede `starts_on`.
pub async fn create_school_year(
    db: &DatabaseConnection,
    name: &str,
    starts_on: NaiveDate,
    ends_on: NaiveDate,
) -> Result<school_year::Model> {
    let name = require_name(name, "School year")?;
    if ends_on < starts_on {
        return Err(Error::Config {
            message: format!("School year {name} ends before it starts"),
        });
    }
    school_year::ActiveModel {
        name: Set(name),
        starts_on: Set(starts_on),
        ends_on: Set(ends_on),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds a school year by exact name.
pub async fn get_school_year_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<school_year::Model>> {
    SchoolYear::find()
        .filter(school_year::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a school year by id.
pub async fn get_school_year_by_id<C>(db: &C, id: i64) -> Result<Option<school_year::Model>>
where
    C: ConnectionTrait,
{
    SchoolYear::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Reads a `system_state` value.
pub(crate) async fn get_state<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    Ok(SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?
        .map(|s| s.value))
}

/// Inserts or updates a `system_state` value.
pub(crate) async fn set_state<C>(db: &C, key: &str, value: String) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();

    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        system_state::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

/// Id of the active school year, if one has been set.
pub async fn get_active_school_year_id<C>(db: &C) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    match get_state(db, ACTIVE_SCHOOL_YEAR_KEY).await? {
        Some(raw) => raw.parse::<i64>().map(Some).map_err(|e| Error::Config {
            message: format!("Failed to parse active school year id {raw:?}: {e}"),
        }),
        None => Ok(None),
    }
}

/// The active school year, or [`Error::NoActiveSchoolYear`].
pub async fn get_active_school_year<C>(db: &C) -> Result<school_year::Model>
where
    C: ConnectionTrait,
{
    let id = get_active_school_year_id(db)
        .await?
        .ok_or(Error::NoActiveSchoolYear)?;
    get_school_year_by_id(db, id)
        .await?
        .ok_or(Error::SchoolYearNotFound { id })
}

/// Marks a school year as active. Does not touch student balances; use
/// `rollover::process_year_rollover` to move into a new year.
pub async fn set_active_school_year<C>(db: &C, school_year_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    if get_school_year_by_id(db, school_year_id).await?.is_none() {
        return Err(Error::SchoolYearNotFound { id: school_year_id });
    }
    set_state(db, ACTIVE_SCHOOL_YEAR_KEY, school_year_id.to_string()).await?;
    tracing::info!("Active school year set to {school_year_id}");
    Ok(())
}
