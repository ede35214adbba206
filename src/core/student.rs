//! Student business logic - registration and lookups.
//!
//! Registration assigns `enrollment_order`, the persisted position of the
//! student among its guardian's children. The discount rules in
//! `core::eligibility` depend on it, so it is never reassigned. The new
//! student's current-year balance is computed before registration commits.

use crate::{
    core::{guardian, ledger},
    entities::{Section, Student, section, student},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Input for [`create_student`].
#[derive(Debug, Clone)]
pub struct NewStudent {
    /// Owning guardian
    pub guardian_id: i64,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Grade level
    pub grade_level_id: i64,
    /// Section within the grade level
    pub section_id: i64,
}

/// Registers a student under a guardian.
///
/// # Errors
/// - Empty first or last name
/// - Unknown guardian
/// - Section missing or not part of the grade level
pub async fn create_student(db: &DatabaseConnection, input: NewStudent) -> Result<student::Model> {
    let first_name = input.first_name.trim().to_string();
    let last_name = input.last_name.trim().to_string();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(Error::Config {
            message: "Student first and last name cannot be empty".to_string(),
        });
    }

    let txn = db.begin().await?;

    if guardian::get_guardian_by_id(&txn, input.guardian_id)
        .await?
        .is_none()
    {
        return Err(Error::GuardianNotFound {
            id: input.guardian_id,
        });
    }

    let section = Section::find_by_id(input.section_id).one(&txn).await?;
    if section.is_none_or(|s: section::Model| s.grade_level_id != input.grade_level_id) {
        return Err(Error::Config {
            message: format!(
                "Section {} is not part of grade level {}",
                input.section_id, input.grade_level_id
            ),
        });
    }

    let last_order = Student::find()
        .filter(student::Column::GuardianId.eq(input.guardian_id))
        .order_by_desc(student::Column::EnrollmentOrder)
        .one(&txn)
        .await?
        .map_or(0, |s| s.enrollment_order);

    let created = student::ActiveModel {
        guardian_id: Set(input.guardian_id),
        first_name: Set(first_name),
        last_name: Set(last_name),
        grade_level_id: Set(input.grade_level_id),
        section_id: Set(input.section_id),
        enrollment_order: Set(last_order + 1),
        balance: Set(Decimal::ZERO),
        contribution_balance: Set(Decimal::ZERO),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let created = ledger::refresh_student_balance(&txn, created.id).await?;

    txn.commit().await?;

    tracing::info!(
        "Registered student {} ({}) as child #{} of guardian {}",
        created.id,
        created.full_name(),
        created.enrollment_order,
        created.guardian_id
    );
    Ok(created)
}

/// Retrieves a student by id.
pub async fn get_student_by_id<C>(db: &C, student_id: i64) -> Result<Option<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find_by_id(student_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a student by id or fails with [`Error::StudentNotFound`].
pub async fn require_student<C>(db: &C, student_id: i64) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    get_student_by_id(db, student_id)
        .await?
        .ok_or(Error::StudentNotFound { id: student_id })
}

/// A guardian's students, first child first.
pub async fn get_students_for_guardian<C>(db: &C, guardian_id: i64) -> Result<Vec<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .filter(student::Column::GuardianId.eq(guardian_id))
        .order_by_asc(student::Column::EnrollmentOrder)
        .order_by_asc(student::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Students of one section ordered by last name, then first name.
pub async fn get_students_in_section(
    db: &DatabaseConnection,
    section_id: i64,
) -> Result<Vec<student::Model>> {
    Student::find()
        .filter(student::Column::SectionId.eq(section_id))
        .order_by_asc(student::Column::LastName)
        .order_by_asc(student::Column::FirstName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Students of one grade level ordered by id.
pub async fn get_students_in_grade<C>(db: &C, grade_level_id: i64) -> Result<Vec<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .filter(student::Column::GradeLevelId.eq(grade_level_id))
        .order_by_asc(student::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every student ordered by id.
pub async fn get_all_students<C>(db: &C) -> Result<Vec<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .order_by_asc(student::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_student_assigns_enrollment_order() -> Result<()> {
        let (db, school) = setup_with_school().await?;
        let guardian = create_test_guardian(&db, "Maria Santos").await?;

        let first = create_test_student(&db, &school, guardian.id, "Ana").await?;
        let second = create_test_student(&db, &school, guardian.id, "Ben").await?;
        let other_guardian = create_test_guardian(&db, "Jose Cruz").await?;
        let unrelated = create_test_student(&db, &school, other_guardian.id, "Carlo").await?;

        assert_eq!(first.enrollment_order, 1);
        assert_eq!(second.enrollment_order, 2);
        assert_eq!(unrelated.enrollment_order, 1);
        assert_eq!(first.balance, Decimal::ZERO);
        assert_eq!(first.contribution_balance, Decimal::ZERO);

        let siblings = get_students_for_guardian(&db, guardian.id).await?;
        let ids: Vec<i64> = siblings.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_student_validation() -> Result<()> {
        let (db, school) = setup_with_school().await?;
        let guardian = create_test_guardian(&db, "Maria Santos").await?;

        let result = create_student(
            &db,
            NewStudent {
                guardian_id: 999,
                first_name: "Ana".to_string(),
                last_name: "Santos".to_string(),
                grade_level_id: school.grade_level.id,
                section_id: school.section.id,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::GuardianNotFound { id: 999 })));

        let result = create_student(
            &db,
            NewStudent {
                guardian_id: guardian.id,
                first_name: "Ana".to_string(),
                last_name: "Santos".to_string(),
                grade_level_id: school.grade_level.id + 1,
                section_id: school.section.id,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Config { message: _ })));

        let result = create_student(
            &db,
            NewStudent {
                guardian_id: guardian.id,
                first_name: " ".to_string(),
                last_name: "Santos".to_string(),
                grade_level_id: school.grade_level.id,
                section_id: school.section.id,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Config { message: _ })));
        Ok(())
    }

    #[tokio::test]
    async fn test_require_student_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = require_student(&db, 42).await;
        assert!(matches!(result, Err(Error::StudentNotFound { id: 42 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_students_in_section_sorted_by_name() -> Result<()> {
        let (db, school) = setup_with_school().await?;
        let guardian = create_test_guardian(&db, "Maria Santos").await?;
        create_test_student(&db, &school, guardian.id, "Zed").await?;
        create_test_student(&db, &school, guardian.id, "Ana").await?;

        let names: Vec<String> = get_students_in_section(&db, school.section.id)
            .await?
            .into_iter()
            .map(|s| s.first_name)
            .collect();
        assert_eq!(names, vec!["Ana".to_string(), "Zed".to_string()]);
        Ok(())
    }
}
