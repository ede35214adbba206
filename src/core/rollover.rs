//! School-year rollover
//!
//! Moves the school into a new school year. Each student's unpaid
//! current-year balance becomes carry-over, the new year becomes active, and
//! the current-year balance is recomputed against the new year's
//! obligations. The target year is recorded in the `system_state` table so
//! the same rollover is never applied twice.

use crate::{
    core::{ledger, money, school_year, student},
    entities::{school_year as school_year_entity, student as student_entity},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Set, TransactionTrait, prelude::*};

/// `system_state` key holding the id of the last school year rolled into.
pub const LAST_ROLLOVER_KEY: &str = "last_rollover_school_year_id";

/// Result of the rollover for a single student.
#[derive(Debug, Clone)]
pub struct StudentRolloverResult {
    /// Student id
    pub student_id: i64,
    /// Display name
    pub student_name: String,
    /// Carry-over before the rollover
    pub old_carry_over: Decimal,
    /// Outstanding current-year balance moved into carry-over
    pub carried_forward: Decimal,
    /// Carry-over after the rollover
    pub new_carry_over: Decimal,
    /// Outstanding balance for the new school year
    pub new_contribution_balance: Decimal,
}

/// Result of rolling every student into a new school year.
#[derive(Debug, Clone)]
pub struct YearRolloverResult {
    /// School year that was active before, if any
    pub from_school_year_id: Option<i64>,
    /// School year that is now active
    pub to_school_year: school_year_entity::Model,
    /// Per-student results
    pub students: Vec<StudentRolloverResult>,
    /// Sum of all carried-forward balances
    pub total_carried_forward: Decimal,
    /// Students who carried an unpaid balance into the new year
    pub students_with_arrears: usize,
}

/// Id of the last school year rolled into, if any.
pub async fn get_last_rollover_school_year_id<C>(db: &C) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    match school_year::get_state(db, LAST_ROLLOVER_KEY).await? {
        Some(raw) => raw.parse::<i64>().map(Some).map_err(|e| Error::Config {
            message: format!("Failed to parse last rollover school year {raw:?}: {e}"),
        }),
        None => Ok(None),
    }
}

/// Rolls every student into `new_school_year_id`:
///
/// 1. Brings each cached current-year balance up to date
/// 2. Adds it to the student's carry-over `balance`
/// 3. Activates the new school year and recomputes `contribution_balance`
/// 4. Records the target year in `system_state`
///
/// All students are updated in one transaction.
///
/// # Returns
/// * `Ok(Some(result))` - Rollover was performed
/// * `Ok(None)` - Already rolled into this year, or it is already active
///
/// # Errors
/// - The target school year does not exist
/// - The target school year starts no later than the active one
pub async fn process_year_rollover(
    db: &DatabaseConnection,
    new_school_year_id: i64,
) -> Result<Option<YearRolloverResult>> {
    let txn = db.begin().await?;

    let target = school_year::get_school_year_by_id(&txn, new_school_year_id)
        .await?
        .ok_or(Error::SchoolYearNotFound {
            id: new_school_year_id,
        })?;

    if get_last_rollover_school_year_id(&txn).await? == Some(new_school_year_id) {
        tracing::info!("School year {} was already rolled into", target.name);
        return Ok(None);
    }
    let from_school_year = match school_year::get_active_school_year_id(&txn).await? {
        Some(id) => school_year::get_school_year_by_id(&txn, id).await?,
        None => None,
    };
    if let Some(from) = &from_school_year {
        if from.id == target.id {
            tracing::warn!("School year {} is already active, skipping rollover", target.name);
            return Ok(None);
        }
        if target.starts_on <= from.starts_on {
            return Err(Error::Config {
                message: format!(
                    "Cannot roll over from {} into {}: the target year does not start later",
                    from.name, target.name
                ),
            });
        }
    }
    let from_school_year_id = from_school_year.map(|y| y.id);

    // Close out the old year
    let mut carried = Vec::new();
    for s in student::get_all_students(&txn).await? {
        let current = ledger::refresh_student_balance(&txn, s.id).await?;
        let old_carry_over = current.balance;
        let carried_forward = current.contribution_balance.max(Decimal::ZERO);
        let new_carry_over = money::round_currency(old_carry_over + carried_forward);

        let student_name = current.full_name();
        let mut active_model: student_entity::ActiveModel = current.into();
        active_model.balance = Set(new_carry_over);
        active_model.contribution_balance = Set(Decimal::ZERO);
        let updated = active_model.update(&txn).await?;

        carried.push((updated.id, student_name, old_carry_over, carried_forward, new_carry_over));
    }

    school_year::set_active_school_year(&txn, new_school_year_id).await?;

    // Open the new year
    let mut results = Vec::with_capacity(carried.len());
    for (student_id, student_name, old_carry_over, carried_forward, new_carry_over) in carried {
        let refreshed = ledger::refresh_student_balance(&txn, student_id).await?;
        results.push(StudentRolloverResult {
            student_id,
            student_name,
            old_carry_over,
            carried_forward,
            new_carry_over,
            new_contribution_balance: refreshed.contribution_balance,
        });
    }

    school_year::set_state(&txn, LAST_ROLLOVER_KEY, new_school_year_id.to_string()).await?;

    txn.commit().await?;

    let total_carried_forward = money::sum(results.iter().map(|r| r.carried_forward));
    let students_with_arrears = results
        .iter()
        .filter(|r| r.carried_forward > Decimal::ZERO)
        .count();

    tracing::info!(
        "Rolled {} students into {} ({} carried forward)",
        results.len(),
        target.name,
        total_carried_forward
    );

    Ok(Some(YearRolloverResult {
        from_school_year_id,
        to_school_year: target,
        students: results,
        total_carried_forward,
        students_with_arrears,
    }))
}

/// Formats a rollover result into a human-readable summary.
#[must_use]
pub fn format_rollover_summary(result: &YearRolloverResult) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "School Year Rollover - {} - Processed {} students\n",
        result.to_school_year.name,
        result.students.len()
    );

    // write! is infallible when writing to String, so unwrap is safe
    write!(
        summary,
        "  With arrears: {} | Carried forward: {}\n\n",
        result.students_with_arrears,
        money::round_currency(result.total_carried_forward)
    )
    .unwrap();

    for s in &result.students {
        writeln!(
            summary,
            "  {} | carry-over {} -> {} (+{}) | new year due {}",
            s.student_name,
            s.old_carry_over,
            s.new_carry_over,
            s.carried_forward,
            s.new_contribution_balance
        )
        .unwrap();
    }

    summary
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{
            contribution::assign_contribution,
            payment::{NewPayment, record_payment},
        },
        test_utils::*,
    };
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_last_rollover_none() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(get_last_rollover_school_year_id(&db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_rollover_unknown_year() -> Result<()> {
        let db = setup_test_db().await?;
        let result = process_year_rollover(&db, 404).await;
        assert!(matches!(result, Err(Error::SchoolYearNotFound { id: 404 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_rollover_carries_unpaid_balances() -> Result<()> {
        let fx = setup_siblings().await?;
        record_payment(
            &fx.db,
            NewPayment {
                student_id: fx.first.id,
                contribution_id: fx.pta.id,
                school_year_id: fx.school.school_year.id,
                amount: dec!(200),
                receipt_number: None,
            },
        )
        .await?;

        let next = create_test_school_year(&fx.db, "2025-2026").await?;
        assign_contribution(&fx.db, next.id, fx.school.grade_level.id, fx.pta.id, None).await?;

        let result = process_year_rollover(&fx.db, next.id).await?.unwrap();
        assert_eq!(result.from_school_year_id, Some(fx.school.school_year.id));
        assert_eq!(result.students.len(), 3);
        // 1300 + 500 + 1500
        assert_eq!(result.total_carried_forward, dec!(3300));
        assert_eq!(result.students_with_arrears, 3);

        let first = result
            .students
            .iter()
            .find(|s| s.student_id == fx.first.id)
            .unwrap();
        assert_eq!(first.carried_forward, dec!(1300));
        assert_eq!(first.new_carry_over, dec!(1300));
        assert_eq!(first.new_contribution_balance, dec!(500));

        let stored = student::require_student(&fx.db, fx.second.id).await?;
        assert_eq!(stored.balance, dec!(500));
        assert_eq!(stored.contribution_balance, dec!(500));

        assert_eq!(
            school_year::get_active_school_year_id(&fx.db).await?,
            Some(next.id)
        );
        assert_eq!(get_last_rollover_school_year_id(&fx.db).await?, Some(next.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_rollover_runs_once_per_year() -> Result<()> {
        let fx = setup_siblings().await?;
        let next = create_test_school_year(&fx.db, "2025-2026").await?;

        assert!(process_year_rollover(&fx.db, next.id).await?.is_some());
        assert!(process_year_rollover(&fx.db, next.id).await?.is_none());

        // Carry-over was applied exactly once
        let first = student::require_student(&fx.db, fx.first.id).await?;
        assert_eq!(first.balance, dec!(1500));
        assert_eq!(first.contribution_balance, Decimal::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_rollover_into_active_year_is_skipped() -> Result<()> {
        let fx = setup_siblings().await?;
        let result = process_year_rollover(&fx.db, fx.school.school_year.id).await?;
        assert!(result.is_none());

        let first = student::require_student(&fx.db, fx.first.id).await?;
        assert_eq!(first.balance, Decimal::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_rollover_into_earlier_year_is_rejected() -> Result<()> {
        let fx = setup_siblings().await?;
        let prior = create_test_school_year(&fx.db, "2023-2024").await?;

        let result = process_year_rollover(&fx.db, prior.id).await;
        assert!(matches!(result, Err(Error::Config { message: _ })));

        // Nothing moved
        let first = student::require_student(&fx.db, fx.first.id).await?;
        assert_eq!(first.balance, Decimal::ZERO);
        assert_eq!(first.contribution_balance, dec!(1500));
        assert_eq!(
            school_year::get_active_school_year_id(&fx.db).await?,
            Some(fx.school.school_year.id)
        );
        assert!(get_last_rollover_school_year_id(&fx.db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_rollover_without_active_year() -> Result<()> {
        let fx = setup_siblings_without_active_year().await?;

        let result = process_year_rollover(&fx.db, fx.school.school_year.id)
            .await?
            .unwrap();
        assert_eq!(result.from_school_year_id, None);
        assert_eq!(
            school_year::get_active_school_year_id(&fx.db).await?,
            Some(fx.school.school_year.id)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_format_rollover_summary() -> Result<()> {
        let fx = setup_siblings().await?;
        let next = create_test_school_year(&fx.db, "2025-2026").await?;
        let result = process_year_rollover(&fx.db, next.id).await?.unwrap();

        let summary = format_rollover_summary(&result);
        assert!(summary.contains("School Year Rollover - 2025-2026 - Processed 3 students"));
        assert!(summary.contains("With arrears: 3"));
        assert!(summary.contains("Ana Santos"));
        Ok(())
    }
}
