use sqlx::SqlitePool;
use tracing::info;

use crate::db::{self, calendars, courses, registrations, users};
use crate::error::AppError;
use crate::models::{
    Calendar, CalendarId, CalendarRequest, PublicCalendarDetail, PublicLecture, UserId,
    VisibilityResponse,
};
use crate::services::guard;
use crate::services::locks::CalendarLocks;

const MAX_NAME_LEN: usize = 100;

pub struct CalendarService {
    db: SqlitePool,
    locks: CalendarLocks,
}

fn validate(req: &CalendarRequest) -> Result<(), AppError> {
    let name = req.calendar_name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("calendar_name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "calendar_name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

impl CalendarService {
    pub fn new(db: SqlitePool, locks: CalendarLocks) -> Self {
        Self { db, locks }
    }

    /// Creates a calendar owned by `caller` and makes it their default.
    pub async fn create(&self, caller: UserId, req: CalendarRequest) -> Result<Calendar, AppError> {
        validate(&req)?;

        let mut tx = db::begin_write(&self.db).await?;
        let calendar = calendars::insert_calendar(&mut *tx, caller, req).await?;
        users::set_default_calendar(&mut *tx, caller, Some(calendar.id)).await?;
        tx.commit().await?;

        info!("user {} created calendar {}", caller, calendar.id);
        Ok(calendar)
    }

    /// Updates an owned calendar and makes it the caller's default.
    pub async fn update(
        &self,
        caller: UserId,
        calendar_id: CalendarId,
        req: CalendarRequest,
    ) -> Result<Calendar, AppError> {
        validate(&req)?;
        let current = guard::authorize(&self.db, calendar_id, caller).await?;

        let mut tx = db::begin_write(&self.db).await?;
        let calendar = calendars::update_calendar(&mut *tx, current, req).await?;
        users::set_default_calendar(&mut *tx, caller, Some(calendar.id)).await?;
        tx.commit().await?;

        Ok(calendar)
    }

    /// Deletes an owned calendar with its registrations. Any user whose
    /// default pointed at it falls back to no default.
    pub async fn delete(&self, caller: UserId, calendar_id: CalendarId) -> Result<Calendar, AppError> {
        let (lock, calendar) = guard::lock_owned(&self.db, &self.locks, calendar_id, caller).await?;
        let mut tx = db::begin_write(&self.db).await?;
        registrations::delete_for_calendar(&mut *tx, calendar_id).await?;
        users::clear_default_calendar(&mut *tx, calendar_id).await?;
        calendars::delete_calendar(&mut *tx, calendar_id).await?;
        tx.commit().await?;
        drop(lock);
        self.locks.forget(calendar_id);

        info!("user {} deleted calendar {}", caller, calendar_id);
        Ok(calendar)
    }

    pub async fn get(&self, caller: Option<UserId>, calendar_id: CalendarId) -> Result<Calendar, AppError> {
        guard::readable_calendar(&self.db, calendar_id, caller).await
    }

    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Calendar>, AppError> {
        Ok(calendars::fetch_user_calendars(&self.db, user_id).await?)
    }

    pub async fn list_public(&self) -> Result<Vec<Calendar>, AppError> {
        Ok(calendars::fetch_public_calendars(&self.db).await?)
    }

    pub async fn set_visibility(
        &self,
        caller: UserId,
        calendar_id: CalendarId,
        is_public: bool,
    ) -> Result<VisibilityResponse, AppError> {
        guard::authorize(&self.db, calendar_id, caller).await?;
        calendars::set_visibility(&self.db, calendar_id, is_public).await?;

        info!("calendar {} is_public={}", calendar_id, is_public);
        Ok(VisibilityResponse {
            calendar_id,
            is_public,
        })
    }

    /// Timetable of a public calendar for read-only viewers.
    pub async fn public_detail(&self, calendar_id: CalendarId) -> Result<PublicCalendarDetail, AppError> {
        let calendar = guard::public_calendar(&self.db, calendar_id).await?;

        let registered = registrations::list_registrations(&self.db, calendar_id).await?;
        let ids: Vec<_> = registered.iter().map(|r| r.course_id).collect();
        let found = courses::fetch_courses_by_ids(&self.db, &ids).await?;

        let lectures = registered
            .iter()
            .filter_map(|r| {
                found.iter().find(|c| c.id == r.course_id).map(|c| PublicLecture {
                    period: r.period_label.clone(),
                    subject: c.subject.clone(),
                    teacher: c.teacher.clone(),
                    semester: c.semester.clone(),
                    url: c.url.clone(),
                })
            })
            .collect();

        Ok(PublicCalendarDetail {
            calendar_id: calendar.id,
            calendar_name: calendar.calendar_name,
            campus: calendar.campus,
            department: calendar.department,
            semester: calendar.semester,
            sat_flag: calendar.sat_flag,
            sixth_period_flag: calendar.sixth_period_flag,
            lectures,
        })
    }
}
