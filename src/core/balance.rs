//! Balance aggregation over already loaded ledger data.
//!
//! The per-obligation balance is `effective amount - payments` for one
//! `(student, contribution, school year)`. Balances are kept unclamped so
//! overpayments net correctly in totals; [`display_balance`] clamps for views.
//! Payments with no school year are legacy rows and never match.

use crate::{
    core::{
        eligibility::{self, AllowedContribution},
        money,
    },
    entities::{contribution, donation, expense, payment, school_year_contribution, student},
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Payment progress of an obligation or a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing left to pay
    FullyPaid,
    /// Something paid, something still owed
    Partial,
    /// Owed and nothing paid yet
    Unpaid,
}

impl PaymentStatus {
    /// Classifies a balance given what has been paid toward it.
    #[must_use]
    pub fn classify(balance: Decimal, total_paid: Decimal) -> Self {
        if balance <= Decimal::ZERO {
            Self::FullyPaid
        } else if total_paid > Decimal::ZERO {
            Self::Partial
        } else {
            Self::Unpaid
        }
    }

    /// Label used in reports
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FullyPaid => "Fully paid",
            Self::Partial => "Partial",
            Self::Unpaid => "Unpaid",
        }
    }
}

/// Sum of payments toward one obligation.
#[must_use]
pub fn amount_paid(
    payments: &[payment::Model],
    student_id: i64,
    contribution_id: i64,
    school_year_id: i64,
) -> Decimal {
    money::sum(
        payments
            .iter()
            .filter(|p| {
                p.student_id == student_id
                    && p.contribution_id == contribution_id
                    && p.school_year_id == Some(school_year_id)
            })
            .map(|p| p.amount_paid),
    )
}

/// Unclamped balance of one obligation: `required - paid`.
#[must_use]
pub fn balance(required: Decimal, paid: Decimal) -> Decimal {
    money::round_currency(required - paid)
}

/// Balance as shown to users, never below zero.
#[must_use]
pub fn display_balance(balance: Decimal) -> Decimal {
    balance.max(Decimal::ZERO)
}

/// Carry-over plus current-year outstanding, as cached on the student row.
#[must_use]
pub fn student_total_balance(student: &student::Model) -> Decimal {
    money::round_currency(student.balance + student.contribution_balance)
}

/// Everything needed to compute balances for one school year.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    /// School year the snapshot covers
    pub school_year_id: i64,
    /// Students in scope, together with all their siblings
    pub students: Vec<student::Model>,
    /// Every contribution referenced by `bindings`
    pub contributions: Vec<contribution::Model>,
    /// Bindings for `school_year_id`
    pub bindings: Vec<school_year_contribution::Model>,
    /// Payments of `school_year_id` for the students in scope
    pub payments: Vec<payment::Model>,
}

/// One contribution line on a student's statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObligationLine {
    /// Contribution id
    pub contribution_id: i64,
    /// Contribution name
    pub name: String,
    /// Whether the contribution is mandatory
    pub mandatory: bool,
    /// Amount owed after overrides and discounts
    pub required: Decimal,
    /// Amount paid so far
    pub paid: Decimal,
    /// Unclamped `required - paid`
    pub balance: Decimal,
    /// Payment progress
    pub status: PaymentStatus,
}

/// A student's statement for one school year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentLedger {
    /// Student id
    pub student_id: i64,
    /// Display name
    pub student_name: String,
    /// Guardian id
    pub guardian_id: i64,
    /// Grade level id
    pub grade_level_id: i64,
    /// Section id
    pub section_id: i64,
    /// Whether the discount rules treat this student as the first child
    pub first_child: bool,
    /// One line per allowed contribution
    pub lines: Vec<ObligationLine>,
    /// Sum of `lines[].required`
    pub total_required: Decimal,
    /// Sum of `lines[].paid`
    pub total_paid: Decimal,
    /// Sum of `lines[].balance`
    pub balance: Decimal,
    /// Sum of positive obligation balances; overpaid lines count as zero
    pub outstanding: Decimal,
    /// Carry-over from prior years, as cached on the student
    pub carry_over: Decimal,
    /// Payment progress for the year
    pub status: PaymentStatus,
}

impl LedgerSnapshot {
    /// Contributions that apply to `student` in this snapshot's school year.
    #[must_use]
    pub fn allowed_for(&self, student: &student::Model) -> Vec<AllowedContribution> {
        eligibility::allowed_contributions(
            student,
            &self.students,
            &self.bindings,
            &self.contributions,
            Some(self.school_year_id),
        )
    }

    /// Balance of one obligation, or `None` when the contribution does not
    /// apply to the student this year.
    #[must_use]
    pub fn balance_of(&self, student: &student::Model, contribution_id: i64) -> Option<Decimal> {
        let first_child = eligibility::is_first_child(student, &self.students);
        self.allowed_for(student)
            .into_iter()
            .find(|a| a.id() == contribution_id)
            .map(|allowed| {
                let required = eligibility::allowed_amount(first_child, &allowed);
                let paid = amount_paid(
                    &self.payments,
                    student.id,
                    contribution_id,
                    self.school_year_id,
                );
                balance(required, paid)
            })
    }

    /// Builds the full statement for one student.
    #[must_use]
    pub fn student_ledger(&self, student: &student::Model) -> StudentLedger {
        let first_child = eligibility::is_first_child(student, &self.students);

        let lines: Vec<ObligationLine> = self
            .allowed_for(student)
            .into_iter()
            .map(|allowed| {
                let required = eligibility::allowed_amount(first_child, &allowed);
                let paid = amount_paid(
                    &self.payments,
                    student.id,
                    allowed.id(),
                    self.school_year_id,
                );
                let balance = balance(required, paid);
                ObligationLine {
                    contribution_id: allowed.id(),
                    name: allowed.contribution.name,
                    mandatory: allowed.contribution.mandatory,
                    required,
                    paid,
                    balance,
                    status: PaymentStatus::classify(balance, paid),
                }
            })
            .collect();

        let total_required = money::sum(lines.iter().map(|l| l.required));
        let total_paid = money::sum(lines.iter().map(|l| l.paid));
        let balance = money::sum(lines.iter().map(|l| l.balance));
        let outstanding = money::sum(lines.iter().map(|l| display_balance(l.balance)));

        StudentLedger {
            student_id: student.id,
            student_name: student.full_name(),
            guardian_id: student.guardian_id,
            grade_level_id: student.grade_level_id,
            section_id: student.section_id,
            first_child,
            lines,
            total_required,
            total_paid,
            balance,
            outstanding,
            carry_over: student.balance,
            status: PaymentStatus::classify(outstanding, total_paid),
        }
    }

    /// Statements for every student in the snapshot, ordered by student id.
    #[must_use]
    pub fn student_ledgers(&self) -> Vec<StudentLedger> {
        let mut ledgers: Vec<StudentLedger> =
            self.students.iter().map(|s| self.student_ledger(s)).collect();
        ledgers.sort_by_key(|l| l.student_id);
        ledgers
    }
}

/// Totals for a group of students (a section or a grade level).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    /// Section or grade level id
    pub group_id: i64,
    /// Students in the group
    pub student_count: usize,
    /// Students with nothing left to pay
    pub fully_paid: usize,
    /// Students who paid part of what they owe
    pub partial: usize,
    /// Students who have paid nothing
    pub unpaid: usize,
    /// Sum of required amounts
    pub total_required: Decimal,
    /// Sum of payments
    pub total_paid: Decimal,
    /// Sum of unclamped balances
    pub total_balance: Decimal,
}

impl GroupSummary {
    fn empty(group_id: i64) -> Self {
        Self {
            group_id,
            student_count: 0,
            fully_paid: 0,
            partial: 0,
            unpaid: 0,
            total_required: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            total_balance: Decimal::ZERO,
        }
    }

    fn add(&mut self, ledger: &StudentLedger) {
        self.student_count += 1;
        match ledger.status {
            PaymentStatus::FullyPaid => self.fully_paid += 1,
            PaymentStatus::Partial => self.partial += 1,
            PaymentStatus::Unpaid => self.unpaid += 1,
        }
        self.total_required += ledger.total_required;
        self.total_paid += ledger.total_paid;
        self.total_balance += ledger.balance;
    }
}

fn summarize_by<F>(ledgers: &[StudentLedger], key: F) -> Vec<GroupSummary>
where
    F: Fn(&StudentLedger) -> i64,
{
    let mut groups: BTreeMap<i64, GroupSummary> = BTreeMap::new();
    for ledger in ledgers {
        let id = key(ledger);
        groups
            .entry(id)
            .or_insert_with(|| GroupSummary::empty(id))
            .add(ledger);
    }
    groups.into_values().collect()
}

/// Per-section totals, ordered by section id.
#[must_use]
pub fn summarize_by_section(ledgers: &[StudentLedger]) -> Vec<GroupSummary> {
    summarize_by(ledgers, |l| l.section_id)
}

/// Per-grade-level totals, ordered by grade level id.
#[must_use]
pub fn summarize_by_grade(ledgers: &[StudentLedger]) -> Vec<GroupSummary> {
    summarize_by(ledgers, |l| l.grade_level_id)
}

/// State of the school fund computed from source records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundSummary {
    /// Sum of payments
    pub total_payments: Decimal,
    /// Sum of cash donations
    pub total_cash_donations: Decimal,
    /// Assessed value of in-kind donations (not part of the fund)
    pub total_in_kind_value: Decimal,
    /// Sum of expenses
    pub total_expenses: Decimal,
    /// `payments + cash donations - expenses`
    pub fund_balance: Decimal,
}

impl FundSummary {
    /// Folds raw records into fund totals.
    #[must_use]
    pub fn from_records(
        payments: &[payment::Model],
        donations: &[donation::Model],
        expenses: &[expense::Model],
    ) -> Self {
        let total_payments = money::sum(payments.iter().map(|p| p.amount_paid));
        let total_cash_donations = money::sum(
            donations
                .iter()
                .filter(|d| crate::core::donation::DonationType::of(d).is_cash())
                .map(|d| d.donation_amount),
        );
        let total_in_kind_value = money::sum(
            donations
                .iter()
                .filter(|d| !crate::core::donation::DonationType::of(d).is_cash())
                .map(|d| d.donation_amount),
        );
        let total_expenses = money::sum(expenses.iter().map(|e| e.amount));

        Self {
            total_payments,
            total_cash_donations,
            total_in_kind_value,
            total_expenses,
            fund_balance: money::round_currency(
                total_payments + total_cash_donations - total_expenses,
            ),
        }
    }
}
