use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::models::{
    BatchOutcome, CalendarId, CourseBatchRequest, RegisteredView, RequiredOutcome, RequiredRequest,
};
use crate::services::guard;
use crate::state::AppState;

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
    pub removed: u64,
}

pub async fn insert(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Json(req): Json<CourseBatchRequest>,
) -> Result<Json<BatchOutcome>, AppError> {
    let outcome = state
        .registrations()
        .register_batch(caller, req.calendar_id, &req.course_ids)
        .await?;
    Ok(Json(outcome))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Json(req): Json<CourseBatchRequest>,
) -> Result<Json<DeleteResponse>, AppError> {
    let removed = state
        .registrations()
        .delete_batch(caller, req.calendar_id, &req.course_ids)
        .await?;
    Ok(Json(DeleteResponse {
        message: "Data deleted successfully",
        removed,
    }))
}

pub async fn registered(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(calendar_id): Path<CalendarId>,
) -> Result<Json<RegisteredView>, AppError> {
    guard::readable_calendar(&state.db, calendar_id, caller).await?;
    let view = state.registrations().list_registered(calendar_id).await?;
    Ok(Json(view))
}

pub async fn register_required(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Json(req): Json<RequiredRequest>,
) -> Result<Json<RequiredOutcome>, AppError> {
    let outcome = state
        .registrations()
        .register_required(caller, req.calendar_id, req.grade)
        .await?;
    Ok(Json(outcome))
}
