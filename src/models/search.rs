use serde::{Deserialize, Serialize};

use super::course::{CourseHit, CourseId, CourseSummary};

/// Structured catalog filter. Empty lists and the `指定なし` placeholder match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub semesters: Vec<String>,
    #[serde(default)]
    pub campus: Option<String>,
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub periods: Vec<String>,
    #[serde(default)]
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub calendar_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<CourseHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    pub text: String,
    #[serde(default)]
    pub filter: SearchRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub generated_input: String,
    pub matched_ids: Vec<CourseId>,
    pub results: Vec<CourseHit>,
    pub kougi_summary: Vec<CourseSummary>,
}
