//! Currency arithmetic helpers.
//!
//! All money in the ledger is a [`Decimal`] rounded to two places with midpoint
//! away from zero. Input from forms goes through [`parse_amount`], which fails
//! loudly; display paths may use [`parse_amount_lenient`], which logs and falls
//! back to zero.

use crate::errors::{Error, Result};
use rust_decimal::prelude::*;

/// Number of decimal places kept for currency values
const DECIMAL_PLACES: u32 = 2;

/// Largest single amount accepted at an ingestion boundary
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 2);

/// Rounds a value to currency precision (2 places, half away from zero).
#[must_use]
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Halves an amount, rounding to currency precision.
#[must_use]
pub fn half(value: Decimal) -> Decimal {
    round_currency(value / Decimal::TWO)
}

/// Parses a user supplied amount such as `"1,250.50"`.
///
/// Thousands separators and surrounding whitespace are accepted. Anything that
/// is not a finite decimal number is rejected with [`Error::AmountParse`].
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err(Error::AmountParse {
            input: input.to_string(),
        });
    }
    Decimal::from_str(&cleaned)
        .map(round_currency)
        .map_err(|_| Error::AmountParse {
            input: input.to_string(),
        })
}

/// Parses an amount for display, treating garbage as zero.
///
/// Never feed the result of this function into a write path.
#[must_use]
pub fn parse_amount_lenient(input: &str) -> Decimal {
    parse_amount(input).unwrap_or_else(|e| {
        tracing::warn!("Treating unparseable amount as zero for display: {e}");
        Decimal::ZERO
    })
}

/// Validates an amount at an ingestion boundary: strictly positive and below
/// [`MAX_AMOUNT`]. Returns the amount rounded to currency precision.
pub fn require_positive(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO || amount > MAX_AMOUNT {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(round_currency(amount))
}

/// Validates a non-negative amount (e.g. a contribution's base amount).
pub fn require_non_negative(amount: Decimal) -> Result<Decimal> {
    if amount < Decimal::ZERO || amount > MAX_AMOUNT {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(round_currency(amount))
}

/// Sums an iterator of amounts and rounds the total.
pub fn sum<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    round_currency(amounts.into_iter().sum())
}
