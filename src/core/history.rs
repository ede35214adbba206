//! Funds history projection.
//!
//! Turns stored `funds_history` rows into the chronological view shown on the
//! treasurer and auditor pages. Stored `balance_before`/`balance_after`
//! snapshots are trusted as-is. When a row lacks them, a running balance is
//! carried forward for display only; those rows are flagged `reconstructed`
//! and must not be used as a source of financial totals.
//!
//! The window filter is applied before totals are accumulated, so totals only
//! ever describe the visible rows.

use crate::{
    core::{donation::DonationType, money},
    entities::{donation, funds_history},
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// What a history row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Contribution payment
    Payment,
    /// Cash donation
    CashDonation,
    /// In-kind donation (assessed value, does not move the fund)
    InKindDonation,
    /// Money spent
    Expense,
}

impl EntryKind {
    /// Classifies a stored row. Rows pointing at an unknown donation count as cash.
    #[must_use]
    pub fn classify(row: &funds_history::Model, donations: &HashMap<i64, DonationType>) -> Self {
        if row.payment_id.is_some() {
            Self::Payment
        } else if let Some(donation_id) = row.donation_id {
            match donations.get(&donation_id) {
                Some(DonationType::InKind) => Self::InKindDonation,
                Some(DonationType::Cash) | None => Self::CashDonation,
            }
        } else {
            Self::Expense
        }
    }

    /// Signed effect on the fund balance.
    #[must_use]
    pub fn fund_delta(self, amount: Decimal) -> Decimal {
        match self {
            Self::Payment | Self::CashDonation => amount,
            Self::InKindDonation => Decimal::ZERO,
            Self::Expense => -amount,
        }
    }
}

/// Which rows of the history are visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Calendar month, 1-12
    pub month: Option<u32>,
    /// Calendar year
    pub year: Option<i32>,
    /// Inclusive start date
    pub from: Option<NaiveDate>,
    /// Inclusive end date
    pub to: Option<NaiveDate>,
    /// Case-insensitive substring of the description
    pub search: Option<String>,
}

impl HistoryFilter {
    /// Whether a row with this timestamp and description is visible.
    #[must_use]
    pub fn matches(&self, at: DateTime<Utc>, description: &str) -> bool {
        let date = at.date_naive();
        if self.month.is_some_and(|m| date.month() != m) {
            return false;
        }
        if self.year.is_some_and(|y| date.year() != y) {
            return false;
        }
        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.to.is_some_and(|to| date > to) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => description
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }

    /// Applies the filter to raw rows.
    #[must_use]
    pub fn apply(&self, rows: &[funds_history::Model]) -> Vec<funds_history::Model> {
        rows.iter()
            .filter(|r| self.matches(r.created_at, &r.description))
            .cloned()
            .collect()
    }
}

/// One row of the projected history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    /// Source history row id
    pub id: i64,
    /// When the entry was written
    pub at: DateTime<Utc>,
    /// What the entry records
    pub kind: EntryKind,
    /// Entry amount
    pub amount: Decimal,
    /// Fund balance before the entry
    pub balance_before: Decimal,
    /// Fund balance after the entry
    pub balance_after: Decimal,
    /// True when the balances were carried forward locally
    pub reconstructed: bool,
    /// Description shown in the view
    pub description: String,
}

/// Totals over the visible rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryTotals {
    /// Sum of payment entries
    pub payments: Decimal,
    /// Sum of cash donation entries
    pub cash_donations: Decimal,
    /// Assessed value of in-kind donation entries
    pub in_kind_value: Decimal,
    /// Sum of expense entries
    pub expenses: Decimal,
}

impl HistoryTotals {
    fn add(&mut self, kind: EntryKind, amount: Decimal) {
        let slot = match kind {
            EntryKind::Payment => &mut self.payments,
            EntryKind::CashDonation => &mut self.cash_donations,
            EntryKind::InKindDonation => &mut self.in_kind_value,
            EntryKind::Expense => &mut self.expenses,
        };
        *slot = money::round_currency(*slot + amount);
    }

    /// `payments + cash donations - expenses` over the visible rows.
    #[must_use]
    pub fn net(&self) -> Decimal {
        money::round_currency(self.payments + self.cash_donations - self.expenses)
    }
}

/// The projected history view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryProjection {
    /// Visible rows in ascending time order
    pub rows: Vec<LedgerRow>,
    /// Totals over `rows`
    pub totals: HistoryTotals,
}

/// Maps donation ids to their type for [`EntryKind::classify`].
#[must_use]
pub fn donation_types(donations: &[donation::Model]) -> HashMap<i64, DonationType> {
    donations
        .iter()
        .map(|d| (d.id, DonationType::of(d)))
        .collect()
}

/// Projects stored history rows into the display view.
///
/// `rows` must already be in ascending time order. Running balances for rows
/// without snapshots are carried over the full sequence (seeded from the first
/// row's `balance_before`, or zero) before the filter hides anything.
#[must_use]
pub fn project_history(
    rows: &[funds_history::Model],
    donations: &[donation::Model],
    filter: &HistoryFilter,
) -> HistoryProjection {
    let types = donation_types(donations);
    let mut running = rows
        .first()
        .and_then(|r| r.balance_before)
        .unwrap_or(Decimal::ZERO);

    let mut projection = HistoryProjection::default();
    for row in rows {
        let kind = EntryKind::classify(row, &types);
        let (balance_before, balance_after, reconstructed) =
            match (row.balance_before, row.balance_after) {
                (Some(before), Some(after)) => (before, after, false),
                (Some(before), None) => (before, before + kind.fund_delta(row.amount), true),
                (None, Some(after)) => (after - kind.fund_delta(row.amount), after, true),
                (None, None) => (running, running + kind.fund_delta(row.amount), true),
            };
        running = balance_after;

        if !filter.matches(row.created_at, &row.description) {
            continue;
        }

        projection.totals.add(kind, row.amount);
        projection.rows.push(LedgerRow {
            id: row.id,
            at: row.created_at,
            kind,
            amount: row.amount,
            balance_before: money::round_currency(balance_before),
            balance_after: money::round_currency(balance_after),
            reconstructed,
            description: row.description.clone(),
        });
    }

    projection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0)
            .single()
            .unwrap_or_default()
    }

    fn rows() -> Vec<funds_history::Model> {
        vec![
            fixtures::history_row(1, at(2024, 6, 3), dec!(500), Some(1), None, "PTA Fee - Ana"),
            fixtures::history_row(2, at(2024, 6, 10), dec!(1000), None, Some(1), "Cash from alumni"),
            fixtures::history_row(3, at(2024, 7, 1), dec!(300), None, Some(2), "Chairs"),
            fixtures::history_row(4, at(2024, 7, 15), dec!(250), None, None, "Paint"),
            fixtures::history_row(5, at(2024, 8, 2), dec!(200), Some(2), None, "PTA Fee - Ben"),
        ]
    }

    fn donations() -> Vec<donation::Model> {
        vec![
            fixtures::cash_donation(1, dec!(1000)),
            fixtures::in_kind_donation(2, dec!(300), 5),
        ]
    }

    fn with_snapshots(mut rows: Vec<funds_history::Model>) -> Vec<funds_history::Model> {
        let mut balance = Decimal::ZERO;
        let types = donation_types(&donations());
        for row in &mut rows {
            let kind = EntryKind::classify(row, &types);
            row.balance_before = Some(balance);
            balance += kind.fund_delta(row.amount);
            row.balance_after = Some(balance);
        }
        rows
    }

    #[test]
    fn test_classification() {
        let projection = project_history(&rows(), &donations(), &HistoryFilter::default());
        let kinds: Vec<EntryKind> = projection.rows.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntryKind::Payment,
                EntryKind::CashDonation,
                EntryKind::InKindDonation,
                EntryKind::Expense,
                EntryKind::Payment,
            ]
        );
    }

    #[test]
    fn test_totals_over_everything() {
        let projection = project_history(&rows(), &donations(), &HistoryFilter::default());
        assert_eq!(projection.totals.payments, dec!(700));
        assert_eq!(projection.totals.cash_donations, dec!(1000));
        assert_eq!(projection.totals.in_kind_value, dec!(300));
        assert_eq!(projection.totals.expenses, dec!(250));
        assert_eq!(projection.totals.net(), dec!(1450));
    }

    #[test]
    fn test_stored_snapshots_are_trusted() {
        let mut stored = with_snapshots(rows());
        // A deliberately inconsistent snapshot is shown as stored
        stored[3].balance_after = Some(dec!(42));
        let projection = project_history(&stored, &donations(), &HistoryFilter::default());
        assert_eq!(projection.rows[3].balance_after, dec!(42));
        assert!(projection.rows.iter().all(|r| !r.reconstructed));
    }

    #[test]
    fn test_running_balance_reconstruction() {
        let projection = project_history(&rows(), &donations(), &HistoryFilter::default());
        let afters: Vec<Decimal> = projection.rows.iter().map(|r| r.balance_after).collect();
        assert_eq!(
            afters,
            vec![dec!(500), dec!(1500), dec!(1500), dec!(1250), dec!(1450)]
        );
        assert!(projection.rows.iter().all(|r| r.reconstructed));
    }

    #[test]
    fn test_reconstruction_seeds_from_first_snapshot() {
        let mut raw = rows();
        raw[0].balance_before = Some(dec!(100));
        let projection = project_history(&raw, &donations(), &HistoryFilter::default());
        assert_eq!(projection.rows[0].balance_after, dec!(600));
        assert_eq!(projection.rows[4].balance_after, dec!(1550));
    }

    #[test]
    fn test_filter_then_aggregate_matches_prefiltered_input() {
        let filters = [
            HistoryFilter {
                month: Some(7),
                ..HistoryFilter::default()
            },
            HistoryFilter {
                year: Some(2024),
                month: Some(6),
                ..HistoryFilter::default()
            },
            HistoryFilter {
                from: NaiveDate::from_ymd_opt(2024, 6, 5),
                to: NaiveDate::from_ymd_opt(2024, 7, 15),
                ..HistoryFilter::default()
            },
            HistoryFilter {
                search: Some("pta".to_string()),
                ..HistoryFilter::default()
            },
        ];

        for raw in [rows(), with_snapshots(rows())] {
            for filter in &filters {
                let windowed = project_history(&raw, &donations(), filter);
                let prefiltered =
                    project_history(&filter.apply(&raw), &donations(), &HistoryFilter::default());
                assert_eq!(windowed.totals, prefiltered.totals, "filter {filter:?}");
            }
        }
    }

    #[test]
    fn test_window_keeps_full_sequence_balances() {
        let filter = HistoryFilter {
            month: Some(8),
            ..HistoryFilter::default()
        };
        let projection = project_history(&rows(), &donations(), &filter);
        assert_eq!(projection.rows.len(), 1);
        assert_eq!(projection.rows[0].balance_before, dec!(1250));
        assert_eq!(projection.totals.payments, dec!(200));
        assert_eq!(projection.totals.expenses, Decimal::ZERO);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let filter = HistoryFilter {
            from: NaiveDate::from_ymd_opt(2024, 6, 10),
            to: NaiveDate::from_ymd_opt(2024, 7, 1),
            ..HistoryFilter::default()
        };
        let projection = project_history(&rows(), &donations(), &filter);
        let ids: Vec<i64> = projection.rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
