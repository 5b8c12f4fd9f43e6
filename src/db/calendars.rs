use sqlx::SqliteExecutor;
use sqlx::types::Json;

use crate::models::{Calendar, CalendarId, CalendarRequest, UserId};

const CALENDAR_COLUMNS: &str = "id, user_id, calendar_name, department, semester, campus, \
     sat_flag, sixth_period_flag, is_public, created_at, updated_at";

pub async fn find_calendar<'e, E>(db: E, id: CalendarId) -> Result<Option<Calendar>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Calendar>(&format!(
        "SELECT {CALENDAR_COLUMNS} FROM calendars WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn fetch_user_calendars<'e, E>(db: E, user_id: UserId) -> Result<Vec<Calendar>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Calendar>(&format!(
        "SELECT {CALENDAR_COLUMNS} FROM calendars WHERE user_id = ? ORDER BY id"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_public_calendars<'e, E>(db: E) -> Result<Vec<Calendar>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Calendar>(&format!(
        "SELECT {CALENDAR_COLUMNS} FROM calendars WHERE is_public = 1 ORDER BY updated_at DESC"
    ))
    .fetch_all(db)
    .await
}

pub async fn insert_calendar<'e, E>(
    db: E,
    user_id: UserId,
    req: CalendarRequest,
) -> Result<Calendar, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = super::now();

    let id = sqlx::query(
        r#"
        INSERT INTO calendars
            (user_id, calendar_name, department, semester, campus,
            sat_flag, sixth_period_flag, is_public, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        "#,
    )
    .bind(user_id)
    .bind(&req.calendar_name)
    .bind(Json(&req.department))
    .bind(Json(&req.semester))
    .bind(&req.campus)
    .bind(req.sat_flag)
    .bind(req.sixth_period_flag)
    .bind(req.is_public)
    .bind(&now)
    .execute(db)
    .await?
    .last_insert_rowid();

    Ok(Calendar {
        id,
        user_id,
        calendar_name: req.calendar_name,
        department: req.department,
        semester: req.semester,
        campus: req.campus,
        sat_flag: req.sat_flag,
        sixth_period_flag: req.sixth_period_flag,
        is_public: req.is_public,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Overwrites the editable fields. Ownership is never changed.
pub async fn update_calendar<'e, E>(
    db: E,
    current: Calendar,
    req: CalendarRequest,
) -> Result<Calendar, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = super::now();

    sqlx::query(
        r#"
        UPDATE calendars
        SET calendar_name = ?1,
            department = ?2,
            semester = ?3,
            campus = ?4,
            sat_flag = ?5,
            sixth_period_flag = ?6,
            is_public = ?7,
            updated_at = ?8
        WHERE id = ?9
        "#,
    )
    .bind(&req.calendar_name)
    .bind(Json(&req.department))
    .bind(Json(&req.semester))
    .bind(&req.campus)
    .bind(req.sat_flag)
    .bind(req.sixth_period_flag)
    .bind(req.is_public)
    .bind(&now)
    .bind(current.id)
    .execute(db)
    .await?;

    Ok(Calendar {
        calendar_name: req.calendar_name,
        department: req.department,
        semester: req.semester,
        campus: req.campus,
        sat_flag: req.sat_flag,
        sixth_period_flag: req.sixth_period_flag,
        is_public: req.is_public,
        updated_at: now,
        ..current
    })
}

pub async fn set_visibility<'e, E>(
    db: E,
    id: CalendarId,
    is_public: bool,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = super::now();
    let result = sqlx::query("UPDATE calendars SET is_public = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(is_public)
        .bind(now)
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn delete_calendar<'e, E>(db: E, id: CalendarId) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM calendars WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
