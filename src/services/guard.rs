use sqlx::{SqliteExecutor, SqlitePool};
use tokio::sync::OwnedMutexGuard;
use tracing::warn;

use crate::db::calendars;
use crate::error::AppError;
use crate::models::{Calendar, CalendarId, UserId};
use crate::services::locks::CalendarLocks;

/// Loads the calendar and confirms `caller` owns it. Runs before any mutation.
pub async fn authorize<'e, E>(
    db: E,
    calendar_id: CalendarId,
    caller: UserId,
) -> Result<Calendar, AppError>
where
    E: SqliteExecutor<'e>,
{
    let calendar = calendars::find_calendar(db, calendar_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("calendar {calendar_id} not found")))?;

    if calendar.user_id != caller {
        warn!(calendar_id, caller, owner = calendar.user_id, "ownership check failed");
        return Err(AppError::Forbidden(
            "You are not the owner of this calendar".to_string(),
        ));
    }

    Ok(calendar)
}

/// Takes the calendar lock, then authorizes under it, so the calendar cannot
/// be deleted between the check and the mutation.
pub async fn lock_owned(
    db: &SqlitePool,
    locks: &CalendarLocks,
    calendar_id: CalendarId,
    caller: UserId,
) -> Result<(OwnedMutexGuard<()>, Calendar), AppError> {
    let lock = locks.acquire(calendar_id).await;
    match authorize(db, calendar_id, caller).await {
        Ok(calendar) => Ok((lock, calendar)),
        Err(e) => {
            drop(lock);
            if matches!(e, AppError::NotFound(_)) {
                locks.forget(calendar_id);
            }
            Err(e)
        }
    }
}

/// Loads a calendar for anonymous read access; it must be public.
pub async fn public_calendar<'e, E>(db: E, calendar_id: CalendarId) -> Result<Calendar, AppError>
where
    E: SqliteExecutor<'e>,
{
    let calendar = calendars::find_calendar(db, calendar_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("calendar {calendar_id} not found")))?;

    if !calendar.is_public {
        return Err(AppError::Forbidden("This calendar is not public".to_string()));
    }

    Ok(calendar)
}

/// Owner access, or public access for everyone else.
pub async fn readable_calendar<'e, E>(
    db: E,
    calendar_id: CalendarId,
    caller: Option<UserId>,
) -> Result<Calendar, AppError>
where
    E: SqliteExecutor<'e>,
{
    let calendar = calendars::find_calendar(db, calendar_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("calendar {calendar_id} not found")))?;

    if calendar.is_public || caller == Some(calendar.user_id) {
        Ok(calendar)
    } else {
        Err(AppError::Forbidden("This calendar is not public".to_string()))
    }
}
