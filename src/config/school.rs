//! School configuration loading from config.toml
//!
//! The grade levels, sections, school years and contributions defined in
//! config.toml seed the database on first run. Seeding matches existing rows
//! by name and leaves them untouched, so it is safe to run on every start.

use crate::{
    core::{contribution, ledger, school_year},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_VAR: &str = "SCHOOL_LEDGER_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Grade levels and their sections
    #[serde(default)]
    pub grade_levels: Vec<GradeLevelConfig>,
    /// School years
    #[serde(default)]
    pub school_years: Vec<SchoolYearConfig>,
    /// Contributions and the grade levels they apply to
    #[serde(default)]
    pub contributions: Vec<ContributionConfig>,
}

/// Configuration for a single grade level
#[derive(Debug, Deserialize, Clone)]
pub struct GradeLevelConfig {
    /// Name, e.g. "Grade 7"
    pub name: String,
    /// Section names
    #[serde(default)]
    pub sections: Vec<String>,
}

/// Configuration for a single school year
#[derive(Debug, Deserialize, Clone)]
pub struct SchoolYearConfig {
    /// Name, e.g. "2024-2025"
    pub name: String,
    /// First day, `"YYYY-MM-DD"`
    pub starts_on: NaiveDate,
    /// Last day, `"YYYY-MM-DD"`
    pub ends_on: NaiveDate,
    /// Activate this year when no year is active yet
    #[serde(default)]
    pub active: bool,
}

/// Configuration for a single contribution
#[derive(Debug, Deserialize, Clone)]
pub struct ContributionConfig {
    /// Name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Base amount
    pub amount: Decimal,
    /// Whether every sibling pays it in full
    #[serde(default)]
    pub mandatory: bool,
    /// Grade level names the contribution is bound to for every configured year
    #[serde(default)]
    pub grade_levels: Vec<String>,
    /// Per-year amount overriding `amount`, keyed by school year name
    #[serde(default)]
    pub total_amounts: BTreeMap<String, Decimal>,
}

/// What a seeding run created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// New grade levels
    pub grade_levels: usize,
    /// New sections
    pub sections: usize,
    /// New school years
    pub school_years: usize,
    /// New contributions
    pub contributions: usize,
    /// Student balances that changed after seeding
    pub refreshed_students: usize,
}

/// Loads school configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `$SCHOOL_LEDGER_CONFIG`, or ./config.toml
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.toml".to_string());
    tracing::debug!("Loading configuration from {path}");
    load_config(path)
}

/// Creates whatever the configuration names that the database lacks.
///
/// Contributions are bound to their grade levels for every configured
/// school year. Cached student balances are refreshed afterwards, which
/// also covers a school year activated by this run.
///
/// # Errors
/// - A contribution names an unknown grade level or school year
/// - Any value fails the same validation as the service functions
pub async fn seed_school(db: &DatabaseConnection, config: &Config) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    let mut grade_ids = BTreeMap::new();
    for grade in &config.grade_levels {
        let model = match school_year::get_grade_level_by_name(db, &grade.name).await? {
            Some(existing) => existing,
            None => {
                summary.grade_levels += 1;
                school_year::create_grade_level(db, &grade.name).await?
            }
        };
        for section in &grade.sections {
            if school_year::get_section_by_name(db, model.id, section)
                .await?
                .is_none()
            {
                school_year::create_section(db, model.id, section).await?;
                summary.sections += 1;
            }
        }
        grade_ids.insert(grade.name.clone(), model.id);
    }

    let mut year_ids = BTreeMap::new();
    for year in &config.school_years {
        let model = match school_year::get_school_year_by_name(db, &year.name).await? {
            Some(existing) => existing,
            None => {
                summary.school_years += 1;
                school_year::create_school_year(db, &year.name, year.starts_on, year.ends_on)
                    .await?
            }
        };
        if year.active && school_year::get_active_school_year_id(db).await?.is_none() {
            school_year::set_active_school_year(db, model.id).await?;
        }
        year_ids.insert(year.name.clone(), model.id);
    }

    for item in &config.contributions {
        let model = match contribution::get_contribution_by_name(db, &item.name).await? {
            Some(existing) => existing,
            None => {
                summary.contributions += 1;
                contribution::create_contribution(
                    db,
                    &item.name,
                    item.description.clone(),
                    item.amount,
                    item.mandatory,
                )
                .await?
            }
        };

        if let Some(unknown) = item.total_amounts.keys().find(|y| !year_ids.contains_key(*y)) {
            return Err(Error::Config {
                message: format!(
                    "Contribution {} sets an amount for unknown school year {unknown}",
                    item.name
                ),
            });
        }

        for grade_name in &item.grade_levels {
            let grade_id = grade_ids.get(grade_name).ok_or_else(|| Error::Config {
                message: format!(
                    "Contribution {} names unknown grade level {grade_name}",
                    item.name
                ),
            })?;
            for (year_name, year_id) in &year_ids {
                let total = item.total_amounts.get(year_name).copied();
                contribution::assign_contribution(db, *year_id, *grade_id, model.id, total).await?;
            }
        }
    }

    summary.refreshed_students = ledger::refresh_all_student_balances(db).await?;

    tracing::info!(
        "Seeded {} grade levels, {} sections, {} school years, {} contributions",
        summary.grade_levels,
        summary.sections,
        summary.school_years,
        summary.contributions
    );
    Ok(summary)
}
