//! Shared test utilities for `school-ledger`.
//!
//! This module provides helpers for setting up test databases, seeding a
//! small school, and building entity models for the pure calculators.

use crate::{
    core::{contribution, guardian, school_year, student},
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a school year named like `"2024-2025"`, running June to March.
/// Names that do not start with a year get 2024.
pub async fn create_test_school_year(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::school_year::Model> {
    let start_year = name
        .get(..4)
        .and_then(|y| y.parse::<i32>().ok())
        .unwrap_or(2024);
    let starts_on = NaiveDate::from_ymd_opt(start_year, 6, 1).unwrap_or_default();
    let ends_on = NaiveDate::from_ymd_opt(start_year + 1, 3, 31).unwrap_or_default();
    school_year::create_school_year(db, name, starts_on, ends_on).await
}

/// Creates a guardian with no email or contact number.
pub async fn create_test_guardian(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::guardian::Model> {
    guardian::create_guardian(db, name, None, None).await
}

/// One grade level with one section and a school year.
#[derive(Debug, Clone)]
pub struct TestSchool {
    /// "2024-2025"
    pub school_year: entities::school_year::Model,
    /// "Grade 7"
    pub grade_level: entities::grade_level::Model,
    /// "Rizal", part of `grade_level`
    pub section: entities::section::Model,
}

async fn create_school(db: &DatabaseConnection, activate: bool) -> Result<TestSchool> {
    let school_year = create_test_school_year(db, "2024-2025").await?;
    let grade_level = school_year::create_grade_level(db, "Grade 7").await?;
    let section = school_year::create_section(db, grade_level.id, "Rizal").await?;
    if activate {
        school_year::set_active_school_year(db, school_year.id).await?;
    }
    Ok(TestSchool {
        school_year,
        grade_level,
        section,
    })
}

/// Registers a student in the test school's section, last name "Santos".
pub async fn create_test_student(
    db: &DatabaseConnection,
    school: &TestSchool,
    guardian_id: i64,
    first_name: &str,
) -> Result<entities::student::Model> {
    student::create_student(
        db,
        student::NewStudent {
            guardian_id,
            first_name: first_name.to_string(),
            last_name: "Santos".to_string(),
            grade_level_id: school.grade_level.id,
            section_id: school.section.id,
        },
    )
    .await
}

/// Sets up a database with a school whose school year is active.
/// Returns (db, school) for common test scenarios.
pub async fn setup_with_school() -> Result<(DatabaseConnection, TestSchool)> {
    let db = setup_test_db().await?;
    let school = create_school(&db, true).await?;
    Ok((db, school))
}

/// Two siblings and one unrelated student in the same grade.
///
/// - "PTA Fee" (500, mandatory) and "Field Trip" (1000, optional) are bound
///   to the grade for the school year.
/// - `first` (Ana) owes 1500, `second` (Ben) owes 500.
/// - `third` (Carlo) belongs to another guardian and owes 1500.
pub struct SiblingFixture {
    /// Database
    pub db: DatabaseConnection,
    /// School
    pub school: TestSchool,
    /// Guardian of `first` and `second`
    pub guardian: entities::guardian::Model,
    /// First child
    pub first: entities::student::Model,
    /// Second child
    pub second: entities::student::Model,
    /// Only child of another guardian
    pub third: entities::student::Model,
    /// Mandatory contribution
    pub pta: entities::contribution::Model,
    /// Optional contribution
    pub trip: entities::contribution::Model,
}

async fn build_siblings(activate: bool) -> Result<SiblingFixture> {
    let db = setup_test_db().await?;
    let school = create_school(&db, activate).await?;

    // Bind contributions before registration so cached balances start correct
    let pta =
        contribution::create_contribution(&db, "PTA Fee", None, Decimal::new(500, 0), true).await?;
    let trip =
        contribution::create_contribution(&db, "Field Trip", None, Decimal::new(1000, 0), false)
            .await?;
    for c in [&pta, &trip] {
        contribution::assign_contribution(
            &db,
            school.school_year.id,
            school.grade_level.id,
            c.id,
            None,
        )
        .await?;
    }

    let guardian = create_test_guardian(&db, "Maria Santos").await?;
    let first = create_test_student(&db, &school, guardian.id, "Ana").await?;
    let second = create_test_student(&db, &school, guardian.id, "Ben").await?;
    let other = create_test_guardian(&db, "Jose Cruz").await?;
    let third = create_test_student(&db, &school, other.id, "Carlo").await?;

    Ok(SiblingFixture {
        db,
        school,
        guardian,
        first,
        second,
        third,
        pta,
        trip,
    })
}

/// [`SiblingFixture`] with the school year active.
pub async fn setup_siblings() -> Result<SiblingFixture> {
    build_siblings(true).await
}

/// [`SiblingFixture`] with no active school year; every cached balance is zero.
pub async fn setup_siblings_without_active_year() -> Result<SiblingFixture> {
    build_siblings(false).await
}

/// Overwrites a student's carry-over balance.
pub async fn set_carry_over(
    db: &DatabaseConnection,
    student_id: i64,
    amount: Decimal,
) -> Result<entities::student::Model> {
    let current = student::require_student(db, student_id).await?;
    let mut active: entities::student::ActiveModel = current.into();
    active.balance = Set(amount);
    active.update(db).await.map_err(Into::into)
}

/// In-memory entity models for the pure calculators. Nothing here touches a
/// database; ids are whatever the test passes in.
pub mod fixtures {
    use crate::{
        core::donation::{DonationType, UsageStatus},
        entities::{
            contribution, donation, expense, funds_history, payment, school_year_contribution,
            student,
        },
    };
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0)
            .single()
            .unwrap_or_default()
    }

    /// Student in section `grade * 10 + 1` with zero cached balances.
    pub fn student(id: i64, guardian_id: i64, grade_level_id: i64, enrollment_order: i32) -> student::Model {
        student_in_section(id, guardian_id, grade_level_id, grade_level_id * 10 + 1, enrollment_order)
    }

    /// Student in an explicit section with zero cached balances.
    pub fn student_in_section(
        id: i64,
        guardian_id: i64,
        grade_level_id: i64,
        section_id: i64,
        enrollment_order: i32,
    ) -> student::Model {
        student::Model {
            id,
            guardian_id,
            first_name: format!("Student{id}"),
            last_name: "Test".to_string(),
            grade_level_id,
            section_id,
            enrollment_order,
            balance: Decimal::ZERO,
            contribution_balance: Decimal::ZERO,
            created_at: fixed_time(),
        }
    }

    /// Contribution without a description.
    pub fn contribution(id: i64, name: &str, amount: Decimal, mandatory: bool) -> contribution::Model {
        contribution::Model {
            id,
            name: name.to_string(),
            description: None,
            amount,
            mandatory,
        }
    }

    /// Binding of a contribution to a grade level for a school year.
    pub const fn binding(
        id: i64,
        school_year_id: i64,
        grade_level_id: i64,
        contribution_id: i64,
        total_amount: Option<Decimal>,
    ) -> school_year_contribution::Model {
        school_year_contribution::Model {
            id,
            school_year_id,
            grade_level_id,
            contribution_id,
            total_amount,
        }
    }

    /// Payment made on 2024-06-15.
    pub fn payment(
        id: i64,
        student_id: i64,
        contribution_id: i64,
        school_year_id: Option<i64>,
        amount: Decimal,
    ) -> payment::Model {
        payment::Model {
            id,
            student_id,
            contribution_id,
            school_year_id,
            amount_paid: amount,
            receipt_number: None,
            paid_at: fixed_time(),
        }
    }

    fn donation(id: i64, kind: DonationType, amount: Decimal, quantity: i32) -> donation::Model {
        donation::Model {
            id,
            donor_name: format!("Donor{id}"),
            donation_type: kind.as_str().to_string(),
            donation_amount: amount,
            item_description: None,
            donation_quantity: quantity,
            used_quantity: 0,
            damaged_quantity: 0,
            unusable_quantity: 0,
            usable_quantity: quantity,
            usage_status: UsageStatus::Unused.as_str().to_string(),
            school_year_id: None,
            received_at: fixed_time(),
        }
    }

    /// Cash donation.
    pub fn cash_donation(id: i64, amount: Decimal) -> donation::Model {
        donation(id, DonationType::Cash, amount, 0)
    }

    /// In-kind donation with an assessed value.
    pub fn in_kind_donation(id: i64, amount: Decimal, quantity: i32) -> donation::Model {
        donation(id, DonationType::InKind, amount, quantity)
    }

    /// Unlinked supplies expense.
    pub fn expense(id: i64, amount: Decimal) -> expense::Model {
        expense::Model {
            id,
            amount,
            expense_type: "supplies".to_string(),
            contribution_id: None,
            donation_id: None,
            description: format!("Expense {id}"),
            school_year_id: None,
            spent_at: fixed_time(),
        }
    }

    /// History row without stored balance snapshots.
    pub fn history_row(
        id: i64,
        at: DateTime<Utc>,
        amount: Decimal,
        payment_id: Option<i64>,
        donation_id: Option<i64>,
        description: &str,
    ) -> funds_history::Model {
        funds_history::Model {
            id,
            amount,
            balance_before: None,
            balance_after: None,
            payment_id,
            donation_id,
            description: description.to_string(),
            created_at: at,
        }
    }
}
