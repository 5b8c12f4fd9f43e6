use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::course::CourseId;

/// Reference row: a course mandated for a department fragment and grade.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RequiredCourse {
    pub id: i64,
    pub department: String,
    pub grade: i64,
    pub course_id: CourseId,
    pub campus: Option<String>,
}
