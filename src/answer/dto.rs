use serde::{Deserialize, Serialize};

use crate::models::CourseId;

#[derive(Debug, Serialize)]
pub struct AnswerApiRequest<'a> {
    pub question: &'a str,
    pub candidate_ids: &'a [CourseId],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerApiResponse {
    #[serde(default)]
    pub generated_query: Option<String>,
    #[serde(default)]
    pub matched_ids: Vec<CourseId>,
}
