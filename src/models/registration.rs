use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::calendar::CalendarId;
use super::course::{Course, CourseId};
use super::slot::{Slot, Weekday};

/// A course placed in a calendar at one slot. Unscheduled courses carry no day/period.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: i64,
    pub calendar_id: CalendarId,
    #[serde(rename = "kougi_id")]
    pub course_id: CourseId,
    pub day: Option<String>,
    pub period: Option<i64>,
    pub period_label: String,
    pub created_at: String,
}

impl Registration {
    pub fn slot(&self) -> Option<Slot> {
        let day = Weekday::parse(self.day.as_deref()?)?;
        let period = u8::try_from(self.period?).ok()?;
        Some(Slot::new(day, period))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseBatchRequest {
    pub calendar_id: CalendarId,
    #[serde(alias = "kougi_ids")]
    pub course_ids: Vec<CourseId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequiredRequest {
    pub calendar_id: CalendarId,
    pub grade: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictEntry {
    #[serde(rename = "kougi_id")]
    pub course_id: CourseId,
    #[serde(rename = "obstacles")]
    pub colliding_courses: Vec<Course>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    #[serde(rename = "kougi_id")]
    pub course_id: CourseId,
    pub error: String,
}

/// Per-ID classification of a registration batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<CourseId>,
    pub conflicted: Vec<ConflictEntry>,
    pub errored: Vec<ErrorEntry>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RequiredOutcome {
    pub registered: usize,
    pub skipped: usize,
    pub errors: Vec<ErrorEntry>,
}

/// Registrations of a calendar with the course details resolved.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredView {
    #[serde(rename = "registered_user_kougi")]
    pub registered: Vec<Registration>,
    #[serde(rename = "results")]
    pub courses: Vec<Course>,
}
