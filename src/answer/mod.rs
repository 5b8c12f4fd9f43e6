pub mod dto;

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::AppError;
use crate::models::CourseId;

#[derive(Clone, Debug)]
pub struct AnswerConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub top_k: Option<u32>,
    pub timeout: Duration,
}

impl AnswerConfig {
    /// Reads `ANSWER_API_URL`, `ANSWER_API_KEY`, `ANSWER_TOP_K` and
    /// `ANSWER_TIMEOUT_SECS`. Returns `None` when no service URL is configured.
    pub fn new_from_env() -> Result<Option<Self>, AppError> {
        let Ok(api_url) = env::var("ANSWER_API_URL") else {
            return Ok(None);
        };
        let api_key = env::var("ANSWER_API_KEY").ok();
        let top_k = match env::var("ANSWER_TOP_K") {
            Ok(v) => Some(v.parse::<u32>().map_err(|_| {
                AppError::Validation(format!("ANSWER_TOP_K is not a number: {v}"))
            })?),
            Err(_) => None,
        };
        let timeout_secs = match env::var("ANSWER_TIMEOUT_SECS") {
            Ok(v) => v.parse::<u64>().map_err(|_| {
                AppError::Validation(format!("ANSWER_TIMEOUT_SECS is not a number: {v}"))
            })?,
            Err(_) => 30,
        };

        Ok(Some(Self {
            api_url,
            api_key,
            top_k,
            timeout: Duration::from_secs(timeout_secs),
        }))
    }
}

/// What the ranking service made of a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub generated_query: String,
    pub course_ids: Vec<CourseId>,
}

/// Maps a free-text question to a ranked subset of candidate courses.
#[async_trait]
pub trait AnswerClient: Send + Sync {
    async fn answer(&self, question: &str, candidates: &[CourseId]) -> Result<Answer, AppError>;
}

pub struct HttpAnswerClient {
    client: Client,
    config: AnswerConfig,
}

impl HttpAnswerClient {
    pub fn new(config: AnswerConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl AnswerClient for HttpAnswerClient {
    async fn answer(&self, question: &str, candidates: &[CourseId]) -> Result<Answer, AppError> {
        let request_body = dto::AnswerApiRequest {
            question,
            candidate_ids: candidates,
            top_k: self.config.top_k,
        };

        let mut request = self.client.post(&self.config.api_url).json(&request_body);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("answer request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("answer API error {}: {}", status, body)));
        }

        let parsed: dto::AnswerApiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse answer response: {}", e);
            AppError::Upstream(format!("Failed to parse answer response: {}", e))
        })?;

        debug!("answer service matched {} of {} candidates", parsed.matched_ids.len(), candidates.len());
        Ok(scope_to_candidates(
            parsed.generated_query.unwrap_or_else(|| question.to_string()),
            parsed.matched_ids,
            candidates,
        ))
    }
}

/// Used when no ranking service is configured: echoes the question and
/// returns the candidates unchanged.
pub struct NoopAnswerClient;

#[async_trait]
impl AnswerClient for NoopAnswerClient {
    async fn answer(&self, question: &str, candidates: &[CourseId]) -> Result<Answer, AppError> {
        Ok(Answer {
            generated_query: question.trim().to_string(),
            course_ids: candidates.to_vec(),
        })
    }
}

/// Keeps the service's ranking but drops IDs outside the candidate set and repeats.
pub fn scope_to_candidates(
    generated_query: String,
    matched: Vec<CourseId>,
    candidates: &[CourseId],
) -> Answer {
    let mut course_ids = Vec::with_capacity(matched.len());
    for id in matched {
        if candidates.contains(&id) && !course_ids.contains(&id) {
            course_ids.push(id);
        }
    }
    Answer {
        generated_query,
        course_ids,
    }
}
