use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::UserId;

pub type CalendarId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Calendar {
    pub id: CalendarId,
    pub user_id: UserId,
    pub calendar_name: String,
    #[sqlx(json)]
    pub department: Vec<String>,
    #[sqlx(json)]
    pub semester: Vec<String>,
    pub campus: Option<String>,
    pub sat_flag: bool,
    pub sixth_period_flag: bool,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Calendar {
    /// First department tag; drives required-course matching.
    pub fn primary_department(&self) -> Option<&str> {
        self.department
            .first()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarRequest {
    pub calendar_name: String,
    #[serde(default)]
    pub department: Vec<String>,
    #[serde(default)]
    pub semester: Vec<String>,
    #[serde(default)]
    pub campus: Option<String>,
    #[serde(default)]
    pub sat_flag: bool,
    #[serde(default)]
    pub sixth_period_flag: bool,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityRequest {
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisibilityResponse {
    pub calendar_id: CalendarId,
    pub is_public: bool,
}

/// One lecture row of a public timetable.
#[derive(Debug, Clone, Serialize)]
pub struct PublicLecture {
    pub period: String,
    pub subject: String,
    pub teacher: String,
    pub semester: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicCalendarDetail {
    pub calendar_id: CalendarId,
    pub calendar_name: String,
    pub campus: Option<String>,
    pub department: Vec<String>,
    pub semester: Vec<String>,
    pub sat_flag: bool,
    pub sixth_period_flag: bool,
    pub lectures: Vec<PublicLecture>,
}
