use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

use crate::models::{Course, CourseId};

const COURSE_COLUMNS: &str =
    "id, subject, teacher, department, semester, campus, period, summary, url";

pub async fn find_course<'e, E>(db: E, id: CourseId) -> Result<Option<Course>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Courses for the given IDs, in the order the IDs were given. Unknown IDs
/// are skipped; repeated IDs yield one course.
pub async fn fetch_courses_by_ids<'e, E>(
    db: E,
    ids: &[CourseId],
) -> Result<Vec<Course>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE id IN ("
    ));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let mut found = qb.build_query_as::<Course>().fetch_all(db).await?;

    let mut ordered = Vec::with_capacity(found.len());
    for id in ids {
        if let Some(pos) = found.iter().position(|c| c.id == *id) {
            ordered.push(found.swap_remove(pos));
        }
    }
    Ok(ordered)
}

/// Catalog rows matching the SQL-expressible part of a filter.
///
/// `departments` and `semesters` are any-of exact matches, `keyword` is a
/// substring of subject, teacher or summary. Slot filters are applied by the
/// caller on the parsed period label.
pub async fn query_courses<'e, E>(
    db: E,
    departments: &[String],
    semesters: &[String],
    campus: Option<&str>,
    keyword: Option<&str>,
) -> Result<Vec<Course>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE 1 = 1"
    ));

    if !departments.is_empty() {
        qb.push(" AND department IN (");
        let mut separated = qb.separated(", ");
        for department in departments {
            separated.push_bind(department.clone());
        }
        separated.push_unseparated(")");
    }

    if !semesters.is_empty() {
        qb.push(" AND semester IN (");
        let mut separated = qb.separated(", ");
        for semester in semesters {
            separated.push_bind(semester.clone());
        }
        separated.push_unseparated(")");
    }

    if let Some(campus) = campus {
        qb.push(" AND campus = ").push_bind(campus.to_string());
    }

    if let Some(keyword) = keyword {
        qb.push(" AND (instr(subject, ")
            .push_bind(keyword.to_string())
            .push(") > 0 OR instr(teacher, ")
            .push_bind(keyword.to_string())
            .push(") > 0 OR instr(summary, ")
            .push_bind(keyword.to_string())
            .push(") > 0)");
    }

    qb.push(" ORDER BY id");
    qb.build_query_as::<Course>().fetch_all(db).await
}

pub async fn upsert_course<'e, E>(db: E, course: &Course) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO courses
            (id, subject, teacher, department, semester, campus, period, summary, url)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(id) DO UPDATE SET
            subject = excluded.subject,
            teacher = excluded.teacher,
            department = excluded.department,
            semester = excluded.semester,
            campus = excluded.campus,
            period = excluded.period,
            summary = excluded.summary,
            url = excluded.url
        "#,
    )
    .bind(course.id)
    .bind(&course.subject)
    .bind(&course.teacher)
    .bind(&course.department)
    .bind(&course.semester)
    .bind(&course.campus)
    .bind(&course.period)
    .bind(&course.summary)
    .bind(&course.url)
    .execute(db)
    .await?;

    Ok(())
}
