use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

use crate::models::{CalendarId, CourseId, Registration, Slot};

const REGISTRATION_COLUMNS: &str =
    "id, calendar_id, course_id, day, period, period_label, created_at";

pub async fn list_registrations<'e, E>(
    db: E,
    calendar_id: CalendarId,
) -> Result<Vec<Registration>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Registration>(&format!(
        "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE calendar_id = ? ORDER BY id"
    ))
    .bind(calendar_id)
    .fetch_all(db)
    .await
}

/// Registrations in the calendar occupying any of `slots`.
pub async fn find_in_slots<'e, E>(
    db: E,
    calendar_id: CalendarId,
    slots: &[Slot],
) -> Result<Vec<Registration>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    if slots.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE calendar_id = "
    ));
    qb.push_bind(calendar_id);
    qb.push(" AND (");
    for (i, slot) in slots.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push("(day = ")
            .push_bind(slot.day.as_str())
            .push(" AND period = ")
            .push_bind(i64::from(slot.period))
            .push(")");
    }
    qb.push(") ORDER BY id");

    qb.build_query_as::<Registration>().fetch_all(db).await
}

pub async fn find_by_course<'e, E>(
    db: E,
    calendar_id: CalendarId,
    course_id: CourseId,
) -> Result<Vec<Registration>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Registration>(&format!(
        "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE calendar_id = ? AND course_id = ? ORDER BY id"
    ))
    .bind(calendar_id)
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn insert_registration<'e, E>(
    db: E,
    calendar_id: CalendarId,
    course_id: CourseId,
    slot: Option<Slot>,
    period_label: &str,
) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let day = slot.map(|s| s.day.as_str());
    let period = slot.map(|s| i64::from(s.period));
    let now = super::now();

    let result = sqlx::query(
        r#"
        INSERT INTO registrations
            (calendar_id, course_id, day, period, period_label, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(calendar_id)
    .bind(course_id)
    .bind(day)
    .bind(period)
    .bind(period_label)
    .bind(now)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Removes every registration of the course from the calendar.
pub async fn delete_registration<'e, E>(
    db: E,
    calendar_id: CalendarId,
    course_id: CourseId,
) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM registrations WHERE calendar_id = ?1 AND course_id = ?2")
        .bind(calendar_id)
        .bind(course_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result)
}

pub async fn delete_for_calendar<'e, E>(db: E, calendar_id: CalendarId) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM registrations WHERE calendar_id = ?1")
        .bind(calendar_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result)
}
