//! Contribution eligibility and amount resolution.
//!
//! A guardian's first child owes every contribution bound to its grade level.
//! Every later child owes only the mandatory ones, and any optional contribution
//! priced for a later child is halved. "First" is the lowest
//! `(enrollment_order, id)` among the guardian's students, never the order a
//! query happened to return them in.
//!
//! Everything here is pure: the functions take already loaded models and have
//! no hidden state, so repeated calls with the same input agree.

use crate::{
    core::money,
    entities::{contribution, school_year_contribution, student},
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Returns the id of the guardian's first child among `siblings`.
///
/// `siblings` may contain students of other guardians; only those sharing
/// `guardian_id` are considered.
#[must_use]
pub fn first_child_id(guardian_id: i64, siblings: &[student::Model]) -> Option<i64> {
    siblings
        .iter()
        .filter(|s| s.guardian_id == guardian_id)
        .min_by_key(|s| (s.enrollment_order, s.id))
        .map(|s| s.id)
}

/// Whether `student` is its guardian's first child.
///
/// A student missing from `siblings` is still compared against them, so passing
/// only the other children gives the same answer as passing all of them.
#[must_use]
pub fn is_first_child(student: &student::Model, siblings: &[student::Model]) -> bool {
    siblings
        .iter()
        .filter(|s| s.guardian_id == student.guardian_id && s.id != student.id)
        .all(|s| (student.enrollment_order, student.id) < (s.enrollment_order, s.id))
}

/// A contribution that applies to a student, with the binding that made it apply.
#[derive(Debug, Clone, PartialEq)]
pub struct AllowedContribution {
    /// The contribution itself
    pub contribution: contribution::Model,
    /// The school year binding, carrying the optional amount override
    pub binding: school_year_contribution::Model,
}

impl AllowedContribution {
    /// Contribution id shortcut
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.contribution.id
    }
}

/// Resolves the contributions that apply to `student`.
///
/// Bindings are matched on the student's grade level and, when given, the
/// school year. Duplicate bindings for the same contribution collapse to the
/// one with the lowest id. Results are ordered by contribution id.
#[must_use]
pub fn allowed_contributions(
    student: &student::Model,
    siblings: &[student::Model],
    bindings: &[school_year_contribution::Model],
    contributions: &[contribution::Model],
    school_year_id: Option<i64>,
) -> Vec<AllowedContribution> {
    let first_child = is_first_child(student, siblings);

    let mut by_contribution: BTreeMap<i64, &school_year_contribution::Model> = BTreeMap::new();
    for binding in bindings.iter().filter(|b| {
        b.grade_level_id == student.grade_level_id
            && school_year_id.is_none_or(|year| b.school_year_id == year)
    }) {
        by_contribution
            .entry(binding.contribution_id)
            .and_modify(|kept| {
                if binding.id < kept.id {
                    *kept = binding;
                }
            })
            .or_insert(binding);
    }

    by_contribution
        .into_iter()
        .filter_map(|(contribution_id, binding)| {
            let contribution = contributions.iter().find(|c| c.id == contribution_id)?;
            (first_child || contribution.mandatory).then(|| AllowedContribution {
                contribution: contribution.clone(),
                binding: binding.clone(),
            })
        })
        .collect()
}

/// Resolves the amount a student owes for one contribution.
///
/// The base is `override_amount`, else the binding's `total_amount`, else the
/// contribution's own amount. Later children pay half of optional
/// contributions. The result is rounded to currency precision.
#[must_use]
pub fn effective_amount(
    first_child: bool,
    contribution: &contribution::Model,
    binding: Option<&school_year_contribution::Model>,
    override_amount: Option<Decimal>,
) -> Decimal {
    let base = override_amount
        .or_else(|| binding.and_then(|b| b.total_amount))
        .unwrap_or(contribution.amount);

    if !first_child && !contribution.mandatory {
        money::half(base)
    } else {
        money::round_currency(base)
    }
}

/// Amount owed for an already resolved [`AllowedContribution`].
#[must_use]
pub fn allowed_amount(first_child: bool, allowed: &AllowedContribution) -> Decimal {
    effective_amount(first_child, &allowed.contribution, Some(&allowed.binding), None)
}
