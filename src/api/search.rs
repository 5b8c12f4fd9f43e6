use axum::Json;
use axum::extract::{Query, State};
use serde::Serialize;

use crate::auth::MaybeUser;
use crate::error::AppError;
use crate::models::{
    AnswerRequest, AnswerResponse, CourseId, CourseSummary, SearchParams, SearchRequest,
    SearchResponse,
};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SummaryResponse {
    pub results: Vec<CourseSummary>,
}

pub async fn search(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Query(params): Query<SearchParams>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let results = state.search().search(&req, caller, params.calendar_id).await?;
    Ok(Json(SearchResponse { results }))
}

pub async fn answer(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Query(params): Query<SearchParams>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let response = state
        .search()
        .answer(&req.text, &req.filter, caller, params.calendar_id)
        .await?;
    Ok(Json(response))
}

pub async fn summary(
    State(state): State<AppState>,
    Json(ids): Json<Vec<CourseId>>,
) -> Result<Json<SummaryResponse>, AppError> {
    let results = state.search().summaries(&ids).await?;
    Ok(Json(SummaryResponse { results }))
}
