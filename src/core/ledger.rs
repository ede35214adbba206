//! Loading ledger snapshots and maintaining the cached student balances.
//!
//! [`refresh_student_balance`] is the only place `contribution_balance` is
//! computed from the ledger. Write paths call it inside their transaction so
//! the cache never disagrees with the payments that produced it.

use crate::{
    core::{balance::LedgerSnapshot, contribution, money, school_year, student},
    entities::{Payment, payment, student as student_entity},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::{Set, prelude::*};

/// Which students a snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotScope {
    /// Every student
    All,
    /// One guardian's children
    Guardian(i64),
}

/// Loads everything needed to compute balances for one school year.
///
/// Contributions and bindings are loaded in full; payments are limited to the
/// school year (legacy rows without a year are excluded).
pub async fn load_snapshot<C>(
    db: &C,
    school_year_id: i64,
    scope: SnapshotScope,
) -> Result<LedgerSnapshot>
where
    C: ConnectionTrait,
{
    let students = match scope {
        SnapshotScope::All => student::get_all_students(db).await?,
        SnapshotScope::Guardian(id) => student::get_students_for_guardian(db, id).await?,
    };
    let student_ids: Vec<i64> = students.iter().map(|s| s.id).collect();

    let payments = Payment::find()
        .filter(payment::Column::SchoolYearId.eq(school_year_id))
        .filter(payment::Column::StudentId.is_in(student_ids))
        .all(db)
        .await?;

    Ok(LedgerSnapshot {
        school_year_id,
        students,
        contributions: contribution::get_all_contributions(db).await?,
        bindings: contribution::get_bindings_for_year(db, school_year_id).await?,
        payments,
    })
}

/// Recomputes a student's `contribution_balance` for the active school year and
/// stores it. Without an active school year the cache is set to zero.
///
/// Returns the updated student.
pub async fn refresh_student_balance<C>(db: &C, student_id: i64) -> Result<student_entity::Model>
where
    C: ConnectionTrait,
{
    let current = student::require_student(db, student_id).await?;

    let outstanding = match school_year::get_active_school_year_id(db).await? {
        Some(year_id) => {
            let snapshot =
                load_snapshot(db, year_id, SnapshotScope::Guardian(current.guardian_id)).await?;
            // Overpayment on one contribution does not cover another
            snapshot.student_ledger(&current).outstanding
        }
        None => Decimal::ZERO,
    };

    if outstanding == current.contribution_balance {
        return Ok(current);
    }

    let previous = current.contribution_balance;
    let mut active: student_entity::ActiveModel = current.into();
    active.contribution_balance = Set(outstanding);
    let updated = active.update(db).await?;

    tracing::debug!(
        "Student {} contribution balance {} -> {}",
        student_id,
        previous,
        outstanding
    );
    Ok(updated)
}

/// Refreshes every student's cached balance. Returns how many rows changed.
pub async fn refresh_all_student_balances<C>(db: &C) -> Result<usize>
where
    C: ConnectionTrait,
{
    let mut changed = 0;
    for s in student::get_all_students(db).await? {
        let before = s.contribution_balance;
        let after = refresh_student_balance(db, s.id).await?;
        if after.contribution_balance != before {
            changed += 1;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_load_snapshot_scopes() -> Result<()> {
        let fx = setup_siblings().await?;

        let all = load_snapshot(&fx.db, fx.school.school_year.id, SnapshotScope::All).await?;
        assert_eq!(all.students.len(), 3);
        assert_eq!(all.bindings.len(), 2);

        let family = load_snapshot(
            &fx.db,
            fx.school.school_year.id,
            SnapshotScope::Guardian(fx.guardian.id),
        )
        .await?;
        assert_eq!(family.students.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_without_active_year_is_zero() -> Result<()> {
        let fx = setup_siblings_without_active_year().await?;
        let refreshed = refresh_student_balance(&fx.db, fx.first.id).await?;
        assert_eq!(refreshed.contribution_balance, Decimal::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_uses_sibling_rules() -> Result<()> {
        let fx = setup_siblings().await?;

        let first = refresh_student_balance(&fx.db, fx.first.id).await?;
        let second = refresh_student_balance(&fx.db, fx.second.id).await?;

        // PTA 500 + Field Trip 1000 for the first child, PTA only for the second
        assert_eq!(first.contribution_balance, dec!(1500));
        assert_eq!(second.contribution_balance, dec!(500));
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_all_counts_changes() -> Result<()> {
        let fx = setup_siblings().await?;
        // Registration already computed the caches
        assert_eq!(refresh_all_student_balances(&fx.db).await?, 0);

        let mut stale: student_entity::ActiveModel = fx.first.clone().into();
        stale.contribution_balance = Set(Decimal::ZERO);
        stale.update(&fx.db).await?;

        assert_eq!(refresh_all_student_balances(&fx.db).await?, 1);
        let first = student::require_student(&fx.db, fx.first.id).await?;
        assert_eq!(first.contribution_balance, dec!(1500));
        Ok(())
    }
}
