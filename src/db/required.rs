use sqlx::SqliteExecutor;

use crate::models::{CourseId, RequiredCourse};

/// Rows whose department contains `department_key` (case-sensitive) for `grade`.
pub async fn query_required<'e, E>(
    db: E,
    department_key: &str,
    grade: i64,
) -> Result<Vec<RequiredCourse>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, RequiredCourse>(
        r#"
        SELECT id, department, grade, course_id, campus
        FROM required_courses
        WHERE instr(department, ?1) > 0 AND grade = ?2
        ORDER BY id
        "#,
    )
    .bind(department_key)
    .bind(grade)
    .fetch_all(db)
    .await
}

pub async fn insert_required<'e, E>(
    db: E,
    department: &str,
    grade: i64,
    course_id: CourseId,
    campus: Option<&str>,
) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = sqlx::query(
        "INSERT INTO required_courses (department, grade, course_id, campus) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(department)
    .bind(grade)
    .bind(course_id)
    .bind(campus)
    .execute(db)
    .await?
    .last_insert_rowid();
    Ok(id)
}
