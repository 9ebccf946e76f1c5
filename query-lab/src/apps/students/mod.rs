//! Basic CRUD over a single `Student` table.

pub mod models;

use chrono::NaiveDate;
use query_lab_core::OrmResult;
use query_lab_db::{bulk_update, create_model, save_model, DbExecutor, Model, OrderBy};

pub use models::Student;

/// Creates the `students_student` table.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub async fn create_tables(db: &dyn DbExecutor) -> OrmResult<()> {
    query_lab_db::create_tables(db, &[Student::meta()]).await
}

/// Inserts the four enrolled students.
///
/// # Errors
///
/// Returns an error if an insert fails, e.g. when a student already exists.
#[allow(clippy::field_reassign_with_default)]
pub async fn add_students(db: &dyn DbExecutor) -> OrmResult<()> {
    let mut john = Student::new(
        "FC5204",
        "John",
        "Doe",
        NaiveDate::from_ymd_opt(1995, 5, 15),
        "john.doe@university.com",
    );
    create_model(&mut john, db).await?;

    let mut jane = Student::new("FE0054", "Jane", "Smith", None, "jane.smith@university.com");
    save_model(&mut jane, db).await?;

    let mut alice = Student::default();
    alice.student_id = "FH2014".to_string();
    alice.first_name = "Alice".to_string();
    alice.last_name = "Johnson".to_string();
    alice.birth_date = NaiveDate::from_ymd_opt(1998, 2, 10);
    alice.email = "alice.johnson@university.com".to_string();
    save_model(&mut alice, db).await?;

    let mut bob = Student::new(
        "FH2015",
        "Bob",
        "Wilson",
        NaiveDate::from_ymd_opt(1996, 11, 25),
        "bob.wilson@university.com",
    );
    create_model(&mut bob, db).await?;
    Ok(())
}

/// One line per student, in primary key order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get_students_info(db: &dyn DbExecutor) -> OrmResult<String> {
    let students = Student::objects()
        .all()
        .order_by(vec![OrderBy::asc("id")])
        .execute_query(db)
        .await?;
    Ok(students
        .iter()
        .map(|s| {
            format!(
                "Student №{}: {} {}; Email: {}",
                s.student_id, s.first_name, s.last_name, s.email
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Moves every student to a `first.last@uni-students.com` address.
///
/// # Errors
///
/// Returns an error if a query fails or two students end up with the same
/// address.
pub async fn update_students_emails(db: &dyn DbExecutor) -> OrmResult<()> {
    let mut students = Student::objects().all().execute_query(db).await?;
    for student in &mut students {
        student.email = format!(
            "{}.{}@uni-students.com",
            student.first_name.to_lowercase(),
            student.last_name.to_lowercase()
        );
    }
    let updated = bulk_update(&students, &["email"], db).await?;
    tracing::info!(updated, "student emails updated");
    Ok(())
}

/// Deletes every student.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub async fn truncate_students(db: &dyn DbExecutor) -> OrmResult<()> {
    let deleted = Student::objects().all().delete().delete_exec(db).await?;
    tracing::info!(deleted, "students truncated");
    Ok(())
}
