//! Database configuration module for `school-ledger`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.

use crate::entities::{
    Contribution, Donation, Expense, FundsHistory, GradeLevel, Guardian, Payment, SchoolYear,
    SchoolYearContribution, Section, Student, SystemState,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

/// Database used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/school_ledger.sqlite?mode=rwc";

/// Gets the database URL from the environment or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// For file-backed `SQLite` URLs the parent directory is created first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();

    if let Some(path) = database_url
        .strip_prefix("sqlite://")
        .map(|rest| rest.split('?').next().unwrap_or(rest))
        .filter(|path| !path.is_empty() && !path.starts_with(':'))
    {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    tracing::debug!("Connecting to {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every table that does not exist yet, parents before children.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Guardian).await?;
    create_table(db, &schema, GradeLevel).await?;
    create_table(db, &schema, Section).await?;
    create_table(db, &schema, SchoolYear).await?;
    create_table(db, &schema, Student).await?;
    create_table(db, &schema, Contribution).await?;
    create_table(db, &schema, SchoolYearContribution).await?;
    create_table(db, &schema, Payment).await?;
    create_table(db, &schema, Donation).await?;
    create_table(db, &schema, Expense).await?;
    create_table(db, &schema, FundsHistory).await?;
    create_table(db, &schema, SystemState).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Every table can be queried
        Guardian::find().limit(1).all(&db).await?;
        GradeLevel::find().limit(1).all(&db).await?;
        Section::find().limit(1).all(&db).await?;
        SchoolYear::find().limit(1).all(&db).await?;
        Student::find().limit(1).all(&db).await?;
        Contribution::find().limit(1).all(&db).await?;
        SchoolYearContribution::find().limit(1).all(&db).await?;
        Payment::find().limit(1).all(&db).await?;
        Donation::find().limit(1).all(&db).await?;
        Expense::find().limit(1).all(&db).await?;
        FundsHistory::find().limit(1).all(&db).await?;
        SystemState::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_default_database_url() {
        assert!(DEFAULT_DATABASE_URL.starts_with("sqlite://"));
        assert!(DEFAULT_DATABASE_URL.ends_with("mode=rwc"));
    }
}
