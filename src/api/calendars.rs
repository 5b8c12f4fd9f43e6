use axum::Json;
use axum::extract::{Path, State};

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::models::{
    Calendar, CalendarId, CalendarRequest, PublicCalendarDetail, VisibilityRequest,
    VisibilityResponse,
};
use crate::state::AppState;

pub async fn create_calendar(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Json(req): Json<CalendarRequest>,
) -> Result<Json<Calendar>, AppError> {
    let calendar = state.calendars().create(caller, req).await?;
    Ok(Json(calendar))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(calendar_id): Path<CalendarId>,
) -> Result<Json<Calendar>, AppError> {
    let calendar = state.calendars().get(caller, calendar_id).await?;
    Ok(Json(calendar))
}

pub async fn update_calendar(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(calendar_id): Path<CalendarId>,
    Json(req): Json<CalendarRequest>,
) -> Result<Json<Calendar>, AppError> {
    let calendar = state.calendars().update(caller, calendar_id, req).await?;
    Ok(Json(calendar))
}

pub async fn delete_calendar(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(calendar_id): Path<CalendarId>,
) -> Result<Json<Calendar>, AppError> {
    let calendar = state.calendars().delete(caller, calendar_id).await?;
    Ok(Json(calendar))
}

pub async fn set_visibility(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(calendar_id): Path<CalendarId>,
    Json(req): Json<VisibilityRequest>,
) -> Result<Json<VisibilityResponse>, AppError> {
    let response = state
        .calendars()
        .set_visibility(caller, calendar_id, req.is_public)
        .await?;
    Ok(Json(response))
}

pub async fn list_public(State(state): State<AppState>) -> Result<Json<Vec<Calendar>>, AppError> {
    let calendars = state.calendars().list_public().await?;
    Ok(Json(calendars))
}

pub async fn public_detail(
    State(state): State<AppState>,
    Path(calendar_id): Path<CalendarId>,
) -> Result<Json<PublicCalendarDetail>, AppError> {
    let detail = state.calendars().public_detail(calendar_id).await?;
    Ok(Json(detail))
}
