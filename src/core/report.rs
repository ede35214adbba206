//! Report generation business logic.
//!
//! The builders here are pure: they take a [`LedgerSnapshot`] (or raw
//! records) and return structured data the caller can render. The `load_*`
//! functions fetch what a builder needs for one school year and call it.

use crate::{
    core::{
        balance::{
            FundSummary, GroupSummary, LedgerSnapshot, PaymentStatus, StudentLedger,
            display_balance, summarize_by_grade, summarize_by_section,
        },
        donation, expense,
        ledger::{self, SnapshotScope},
        money, payment as payment_service, school_year,
    },
    entities::{Payment, payment},
    errors::Result,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// One child's statement on the guardian dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct ChildStatement {
    /// Current-year obligations
    pub ledger: StudentLedger,
    /// Carry-over plus positive current-year balances
    pub total_due: Decimal,
}

/// What a guardian sees for all of their children.
#[derive(Debug, Clone, Serialize)]
pub struct GuardianDashboard {
    /// Guardian id
    pub guardian_id: i64,
    /// School year the obligations belong to
    pub school_year_id: i64,
    /// Children, first child first
    pub children: Vec<ChildStatement>,
    /// Sum of required amounts this year
    pub total_required: Decimal,
    /// Sum of payments this year
    pub total_paid: Decimal,
    /// Sum of carry-over from prior years
    pub total_carry_over: Decimal,
    /// Everything still owed, prior years included
    pub total_due: Decimal,
}

/// Builds the dashboard for one guardian from a snapshot containing their children.
#[must_use]
pub fn guardian_dashboard(snapshot: &LedgerSnapshot, guardian_id: i64) -> GuardianDashboard {
    let mut children: Vec<&crate::entities::student::Model> = snapshot
        .students
        .iter()
        .filter(|s| s.guardian_id == guardian_id)
        .collect();
    children.sort_by_key(|s| (s.enrollment_order, s.id));

    let children: Vec<ChildStatement> = children
        .into_iter()
        .map(|s| {
            let ledger = snapshot.student_ledger(s);
            let total_due =
                money::round_currency(display_balance(ledger.carry_over) + ledger.outstanding);
            ChildStatement { ledger, total_due }
        })
        .collect();

    GuardianDashboard {
        guardian_id,
        school_year_id: snapshot.school_year_id,
        total_required: money::sum(children.iter().map(|c| c.ledger.total_required)),
        total_paid: money::sum(children.iter().map(|c| c.ledger.total_paid)),
        total_carry_over: money::sum(children.iter().map(|c| c.ledger.carry_over)),
        total_due: money::sum(children.iter().map(|c| c.total_due)),
        children,
    }
}

/// Loads the guardian dashboard for the active school year.
pub async fn load_guardian_dashboard(
    db: &DatabaseConnection,
    guardian_id: i64,
) -> Result<GuardianDashboard> {
    let year = school_year::get_active_school_year(db).await?;
    let snapshot = ledger::load_snapshot(db, year.id, SnapshotScope::Guardian(guardian_id)).await?;
    Ok(guardian_dashboard(&snapshot, guardian_id))
}

/// School-wide figures for the treasurer.
#[derive(Debug, Clone, Serialize)]
pub struct TreasurerDashboard {
    /// School year the collection figures belong to
    pub school_year_id: i64,
    /// Fund totals across all records
    pub fund: FundSummary,
    /// Students in the snapshot
    pub student_count: usize,
    /// Students with nothing left to pay
    pub fully_paid: usize,
    /// Students who paid part of what they owe
    pub partial: usize,
    /// Students who have paid nothing
    pub unpaid: usize,
    /// Sum of all required amounts this year
    pub total_collectible: Decimal,
    /// Sum of payments this year
    pub total_collected: Decimal,
    /// Sum of positive obligation balances this year
    pub total_outstanding: Decimal,
    /// Legacy payments with no school year
    pub unassigned_payments: usize,
    /// Amount of those legacy payments
    pub unassigned_amount: Decimal,
}

/// Builds the treasurer dashboard.
#[must_use]
pub fn treasurer_dashboard(
    snapshot: &LedgerSnapshot,
    fund: FundSummary,
    unassigned: &[payment::Model],
) -> TreasurerDashboard {
    let ledgers = snapshot.student_ledgers();
    let count = |status: PaymentStatus| ledgers.iter().filter(|l| l.status == status).count();

    TreasurerDashboard {
        school_year_id: snapshot.school_year_id,
        fund,
        student_count: ledgers.len(),
        fully_paid: count(PaymentStatus::FullyPaid),
        partial: count(PaymentStatus::Partial),
        unpaid: count(PaymentStatus::Unpaid),
        total_collectible: money::sum(ledgers.iter().map(|l| l.total_required)),
        total_collected: money::sum(ledgers.iter().map(|l| l.total_paid)),
        total_outstanding: money::sum(ledgers.iter().map(|l| l.outstanding)),
        unassigned_payments: unassigned.len(),
        unassigned_amount: money::sum(unassigned.iter().map(|p| p.amount_paid)),
    }
}

/// Loads the treasurer dashboard for a school year.
pub async fn load_treasurer_dashboard(
    db: &DatabaseConnection,
    school_year_id: i64,
) -> Result<TreasurerDashboard> {
    let snapshot = ledger::load_snapshot(db, school_year_id, SnapshotScope::All).await?;
    let payments = Payment::find().all(db).await?;
    let donations = donation::get_all_donations(db).await?;
    let expenses = expense::get_all_expenses(db).await?;
    let unassigned = payment_service::get_unassigned_payments(db).await?;

    let fund = FundSummary::from_records(&payments, &donations, &expenses);
    Ok(treasurer_dashboard(&snapshot, fund, &unassigned))
}

/// Per-section totals. They add up to the per-student balances.
#[must_use]
pub fn section_report(snapshot: &LedgerSnapshot) -> Vec<GroupSummary> {
    summarize_by_section(&snapshot.student_ledgers())
}

/// Per-grade-level totals. They add up to the per-student balances.
#[must_use]
pub fn grade_report(snapshot: &LedgerSnapshot) -> Vec<GroupSummary> {
    summarize_by_grade(&snapshot.student_ledgers())
}

/// Payments received in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCollection {
    /// Month number, 1-12
    pub month: u32,
    /// Number of payments
    pub payment_count: usize,
    /// Sum of payments
    pub total: Decimal,
}

/// Payment totals for each month of `year`. Always twelve entries.
#[must_use]
pub fn monthly_collections(payments: &[payment::Model], year: i32) -> Vec<MonthlyCollection> {
    let mut months: Vec<MonthlyCollection> = (1..=12)
        .map(|month| MonthlyCollection {
            month,
            payment_count: 0,
            total: Decimal::ZERO,
        })
        .collect();

    for p in payments.iter().filter(|p| p.paid_at.year() == year) {
        // month0 is always 0..=11
        if let Some(entry) = months.get_mut(p.paid_at.month0() as usize) {
            entry.payment_count += 1;
            entry.total += p.amount_paid;
        }
    }

    for entry in &mut months {
        entry.total = money::round_currency(entry.total);
    }
    months
}

/// Collection figures for one contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionBreakdown {
    /// Contribution id
    pub contribution_id: i64,
    /// Contribution name
    pub name: String,
    /// Whether siblings pay it in full
    pub mandatory: bool,
    /// Students the contribution applies to
    pub student_count: usize,
    /// Sum of required amounts
    pub required: Decimal,
    /// Sum of payments
    pub collected: Decimal,
    /// Sum of positive balances
    pub outstanding: Decimal,
}

/// Required, collected and outstanding amounts per contribution, ordered by id.
#[must_use]
pub fn contribution_breakdown(snapshot: &LedgerSnapshot) -> Vec<ContributionBreakdown> {
    let mut rows: BTreeMap<i64, ContributionBreakdown> = BTreeMap::new();

    for ledger in snapshot.student_ledgers() {
        for line in ledger.lines {
            let row = rows
                .entry(line.contribution_id)
                .or_insert_with(|| ContributionBreakdown {
                    contribution_id: line.contribution_id,
                    name: line.name.clone(),
                    mandatory: line.mandatory,
                    student_count: 0,
                    required: Decimal::ZERO,
                    collected: Decimal::ZERO,
                    outstanding: Decimal::ZERO,
                });
            row.student_count += 1;
            row.required += line.required;
            row.collected += line.paid;
            row.outstanding += display_balance(line.balance);
        }
    }

    rows.into_values().collect()
}

/// Formats an amount with two decimals and a thousands separator, e.g.
/// `1,234,567.50` or `-1,000.00`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = money::round_currency(amount);
    let plain = format!("{:.2}", rounded.abs());
    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}

/// Formats a date as `YYYY-MM-DD`, or `-` when missing.
#[must_use]
pub fn format_date_or_placeholder(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

/// One-line summary of a treasurer dashboard.
#[must_use]
pub fn format_treasurer_summary(dashboard: &TreasurerDashboard) -> String {
    format!(
        "Fund {} | Collected {} of {} | {} fully paid, {} partial, {} unpaid | {} unassigned payments",
        format_amount(dashboard.fund.fund_balance),
        format_amount(dashboard.total_collected),
        format_amount(dashboard.total_collectible),
        dashboard.fully_paid,
        dashboard.partial,
        dashboard.unpaid,
        dashboard.unassigned_payments
    )
}
