use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::slot::{Slot, parse_slots};

pub type CourseId = i64;

/// Syllabus record. Imported offline; never written by request handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: CourseId,
    pub subject: String,
    pub teacher: String,
    pub department: String,
    pub semester: String,
    pub campus: String,
    pub period: String,
    pub summary: String,
    pub url: String,
}

impl Course {
    /// Slots this course occupies. Empty when the course is unscheduled.
    pub fn slots(&self) -> Vec<Slot> {
        parse_slots(&self.period)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    pub id: CourseId,
    pub subject: String,
    pub summary: String,
}

impl From<Course> for CourseSummary {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            subject: course.subject,
            summary: course.summary,
        }
    }
}

/// A search hit, flagged when the course already sits in the caller's calendar.
#[derive(Debug, Clone, Serialize)]
pub struct CourseHit {
    #[serde(flatten)]
    pub course: Course,
    pub registered: bool,
}
