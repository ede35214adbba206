//! Core business logic.
//!
//! `money`, `eligibility`, `balance` and `history` are pure calculators over
//! already loaded entity models. The remaining modules are async services
//! over a SeaORM connection.

/// Balance aggregation per obligation, student, group and fund
pub mod balance;
/// Contributions and their per-year grade level bindings
pub mod contribution;
/// Cash and in-kind donations
pub mod donation;
/// Allowed-contribution rules for siblings
pub mod eligibility;
/// Money spent out of the fund
pub mod expense;
/// Appending to and reading the fund history
pub mod funds;
/// Guardian registration and lookups
pub mod guardian;
/// Funds history projection with running balances
pub mod history;
/// Snapshot loading and cached balance maintenance
pub mod ledger;
/// Decimal helpers for currency amounts
pub mod money;
/// Recording contribution payments
pub mod payment;
/// Dashboards, group reports and display helpers
pub mod report;
/// Moving students into a new school year
pub mod rollover;
/// Grade levels, sections, school years and the active year
pub mod school_year;
/// Student registration and lookups
pub mod student;
