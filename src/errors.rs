//! Unified error types for the school ledger.
//!
//! Every fallible operation in the crate returns [`Result`], so callers can
//! propagate with `?` regardless of whether the failure came from the
//! database, configuration, or a rejected business rule.

use rust_decimal::Decimal;
use thiserror::Error;

/// All errors produced by the school ledger.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration or input validation problem
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description of the problem
        message: String,
    },

    /// A monetary amount was rejected (zero, negative, or out of range)
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// A monetary string could not be parsed
    #[error("Could not parse amount from {input:?}")]
    AmountParse {
        /// The raw input that failed to parse
        input: String,
    },

    /// No student with the given id
    #[error("Student not found: {id}")]
    StudentNotFound {
        /// Student id that was looked up
        id: i64,
    },

    /// No guardian with the given id
    #[error("Guardian not found: {id}")]
    GuardianNotFound {
        /// Guardian id that was looked up
        id: i64,
    },

    /// No contribution with the given id
    #[error("Contribution not found: {id}")]
    ContributionNotFound {
        /// Contribution id that was looked up
        id: i64,
    },

    /// No school year with the given id
    #[error("School year not found: {id}")]
    SchoolYearNotFound {
        /// School year id that was looked up
        id: i64,
    },

    /// No donation with the given id
    #[error("Donation not found: {id}")]
    DonationNotFound {
        /// Donation id that was looked up
        id: i64,
    },

    /// An operation needed the active school year but none is set
    #[error("No active school year has been configured")]
    NoActiveSchoolYear,

    /// The contribution does not apply to the student for that school year
    #[error("Contribution {contribution_id} does not apply to student {student_id}")]
    ContributionNotAllowed {
        /// Student the payment was for
        student_id: i64,
        /// Contribution the payment targeted
        contribution_id: i64,
    },

    /// Donation data violates the donation rules
    #[error("Invalid donation: {message}")]
    InvalidDonation {
        /// Which rule was violated
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure (reading config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Integer conversion failure (limits, counts)
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
