//! Payment business logic - recording contribution payments.
//!
//! Recording a payment is one database transaction: the payment row, its
//! funds history entry, and the student's cached balance all change together
//! or not at all. Payments are never edited or deleted afterwards.

use crate::{
    core::{
        balance::LedgerSnapshot,
        funds::{self, EntrySource},
        ledger::{self, SnapshotScope},
        money, school_year, student,
    },
    entities::{Payment, payment, student as student_entity},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Input for [`record_payment`].
#[derive(Debug, Clone)]
pub struct NewPayment {
    /// Student the payment is for
    pub student_id: i64,
    /// Contribution the payment is applied to
    pub contribution_id: i64,
    /// School year of the obligation
    pub school_year_id: i64,
    /// Amount paid
    pub amount: Decimal,
    /// Official receipt number
    pub receipt_number: Option<String>,
}

/// Result of [`record_payment`].
#[derive(Debug, Clone)]
pub struct RecordedPayment {
    /// The stored payment
    pub payment: payment::Model,
    /// The student after the cached balances were updated
    pub student: student_entity::Model,
    /// Obligation balance after the payment (unclamped)
    pub remaining: Decimal,
}

/// Records a payment toward one of a student's contributions.
///
/// For the active school year the student's `contribution_balance` is
/// recomputed from the ledger. A payment toward an earlier school year settles
/// carry-over, reducing `balance` (never below zero). A payment toward a later
/// school year leaves both cached balances alone; rollover picks it up when
/// that year becomes active.
///
/// # Errors
/// - Amount is not positive
/// - Student or school year does not exist
/// - No school year is active
/// - The contribution does not apply to the student for that school year
pub async fn record_payment(db: &DatabaseConnection, input: NewPayment) -> Result<RecordedPayment> {
    let amount = money::require_positive(input.amount)?;

    let txn = db.begin().await?;

    let payer = student::require_student(&txn, input.student_id).await?;
    let target_year = school_year::get_school_year_by_id(&txn, input.school_year_id)
        .await?
        .ok_or(Error::SchoolYearNotFound {
            id: input.school_year_id,
        })?;
    let active_year = school_year::get_active_school_year(&txn).await?;

    let snapshot: LedgerSnapshot = ledger::load_snapshot(
        &txn,
        input.school_year_id,
        SnapshotScope::Guardian(payer.guardian_id),
    )
    .await?;
    let Some(balance_before) = snapshot.balance_of(&payer, input.contribution_id) else {
        return Err(Error::ContributionNotAllowed {
            student_id: payer.id,
            contribution_id: input.contribution_id,
        });
    };

    let receipt_number = input
        .receipt_number
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let inserted = payment::ActiveModel {
        student_id: Set(payer.id),
        contribution_id: Set(input.contribution_id),
        school_year_id: Set(Some(input.school_year_id)),
        amount_paid: Set(amount),
        receipt_number: Set(receipt_number),
        paid_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    funds::append_entry(
        &txn,
        EntrySource::Payment(inserted.id),
        amount,
        format!("Payment from {} (contribution {})", payer.full_name(), input.contribution_id),
    )
    .await?;

    let updated_student = if target_year.id == active_year.id {
        ledger::refresh_student_balance(&txn, payer.id).await?
    } else if target_year.starts_on < active_year.starts_on {
        let carry_over = (payer.balance - amount).max(Decimal::ZERO);
        let mut active: student_entity::ActiveModel = payer.into();
        active.balance = Set(money::round_currency(carry_over));
        active.update(&txn).await?
    } else {
        // Advance payment: counted once the year becomes active
        payer
    };

    txn.commit().await?;

    let remaining = money::round_currency(balance_before - amount);
    tracing::info!(
        "Recorded payment {} of {} for student {} toward contribution {} ({} remaining)",
        inserted.id,
        amount,
        inserted.student_id,
        inserted.contribution_id,
        remaining
    );

    Ok(RecordedPayment {
        payment: inserted,
        student: updated_student,
        remaining,
    })
}

/// A student's payments, newest first.
pub async fn get_payments_for_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<payment::Model>> {
    Payment::find()
        .filter(payment::Column::StudentId.eq(student_id))
        .order_by_desc(payment::Column::PaidAt)
        .order_by_desc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All payments of a school year, oldest first.
pub async fn get_payments_for_year(
    db: &DatabaseConnection,
    school_year_id: i64,
) -> Result<Vec<payment::Model>> {
    Payment::find()
        .filter(payment::Column::SchoolYearId.eq(school_year_id))
        .order_by_asc(payment::Column::PaidAt)
        .order_by_asc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Legacy payments recorded without a school year. They never count toward a
/// year's balance and are listed separately for reconciliation.
pub async fn get_unassigned_payments(db: &DatabaseConnection) -> Result<Vec<payment::Model>> {
    Payment::find()
        .filter(payment::Column::SchoolYearId.is_null())
        .order_by_asc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a payment by id.
pub async fn get_payment_by_id(
    db: &DatabaseConnection,
    payment_id: i64,
) -> Result<Option<payment::Model>> {
    Payment::find_by_id(payment_id)
        .one(db)
        .await
        .map_err(Into::into)
}
