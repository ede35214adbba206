//! School fund ledger - appending to and reading the `funds_history` table.
//!
//! Every write path (payments, donations, expenses) appends exactly one row
//! here inside its own database transaction, so the stored before/after
//! snapshots always chain: a row's `balance_before` is the previous row's
//! `balance_after`.

use crate::{
    core::{
        donation,
        history::{self, EntryKind, HistoryFilter, HistoryProjection},
        money,
    },
    entities::{FundsHistory, funds_history},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Current fund balance: the `balance_after` of the newest row, or zero.
///
/// Rows without a stored snapshot are skipped.
pub async fn current_fund_balance<C>(db: &C) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let latest = FundsHistory::find()
        .filter(funds_history::Column::BalanceAfter.is_not_null())
        .order_by_desc(funds_history::Column::Id)
        .one(db)
        .await?;

    Ok(latest
        .and_then(|row| row.balance_after)
        .unwrap_or(Decimal::ZERO))
}

/// Source record of a new history row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    /// A recorded payment
    Payment(i64),
    /// A logged donation, with its type
    Donation(i64, donation::DonationType),
    /// A logged expense
    Expense,
}

impl EntrySource {
    const fn kind(self) -> EntryKind {
        match self {
            Self::Payment(_) => EntryKind::Payment,
            Self::Donation(_, donation::DonationType::Cash) => EntryKind::CashDonation,
            Self::Donation(_, donation::DonationType::InKind) => EntryKind::InKindDonation,
            Self::Expense => EntryKind::Expense,
        }
    }
}

/// Appends one history row, chaining its snapshot to the previous row.
///
/// Call this with the same transaction that inserted the source record.
pub async fn append_entry<C>(
    db: &C,
    source: EntrySource,
    amount: Decimal,
    description: String,
) -> Result<funds_history::Model>
where
    C: ConnectionTrait,
{
    let balance_before = current_fund_balance(db).await?;
    let balance_after =
        money::round_currency(balance_before + source.kind().fund_delta(amount));

    let (payment_id, donation_id) = match source {
        EntrySource::Payment(id) => (Some(id), None),
        EntrySource::Donation(id, _) => (None, Some(id)),
        EntrySource::Expense => (None, None),
    };

    let row = funds_history::ActiveModel {
        amount: Set(amount),
        balance_before: Set(Some(balance_before)),
        balance_after: Set(Some(balance_after)),
        payment_id: Set(payment_id),
        donation_id: Set(donation_id),
        description: Set(description),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let inserted = row.insert(db).await?;
    tracing::debug!(
        "Fund entry {} ({:?}): {} -> {}",
        inserted.id,
        source,
        balance_before,
        balance_after
    );
    Ok(inserted)
}

/// Retrieves all history rows in write order.
pub async fn get_history_rows(db: &DatabaseConnection) -> Result<Vec<funds_history::Model>> {
    FundsHistory::find()
        .order_by_asc(funds_history::Column::CreatedAt)
        .order_by_asc(funds_history::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads the history and projects it through `filter`.
pub async fn get_history(
    db: &DatabaseConnection,
    filter: &HistoryFilter,
) -> Result<HistoryProjection> {
    let rows = get_history_rows(db).await?;
    let donations = donation::get_all_donations(db).await?;
    Ok(history::project_history(&rows, &donations, filter))
}
