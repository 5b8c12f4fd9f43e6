use sqlx::SqliteExecutor;

use crate::models::{CalendarId, User, UserId};

pub async fn find_user<'e, E>(db: E, id: UserId) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        "SELECT id, name, password_hash, def_calendar, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_user_by_name<'e, E>(db: E, name: &str) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        "SELECT id, name, password_hash, def_calendar, created_at FROM users WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(db)
    .await
}

pub async fn insert_user<'e, E>(db: E, name: &str, password_hash: &str) -> Result<User, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = super::now();
    let id = sqlx::query("INSERT INTO users (name, password_hash, def_calendar, created_at) VALUES (?1, ?2, NULL, ?3)")
        .bind(name)
        .bind(password_hash)
        .bind(&now)
        .execute(db)
        .await?
        .last_insert_rowid();

    Ok(User {
        id,
        name: name.to_string(),
        password_hash: password_hash.to_string(),
        def_calendar: None,
        created_at: now,
    })
}

pub async fn set_default_calendar<'e, E>(
    db: E,
    user_id: UserId,
    calendar_id: Option<CalendarId>,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE users SET def_calendar = ?1 WHERE id = ?2")
        .bind(calendar_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Clears the default calendar of whoever points at `calendar_id`.
pub async fn clear_default_calendar<'e, E>(db: E, calendar_id: CalendarId) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE users SET def_calendar = NULL WHERE def_calendar = ?1")
        .bind(calendar_id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(result)
}
