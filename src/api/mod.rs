mod calendars;
mod kougi;
mod search;
mod users;

use axum::Json;
use axum::routing::{delete, post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use crate::error::AppError;
use crate::reference::{DEPARTMENTS, SEMESTERS};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/departments", get(departments))
        .route("/semesters", get(semesters))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/logout", post(users::logout))
        .route("/users/info", get(users::info))
        .route("/calendar", post(calendars::create_calendar))
        .route("/calendar/public", get(calendars::list_public))
        .route("/calendar/public/{calendar_id}", get(calendars::public_detail))
        .route(
            "/calendar/{calendar_id}",
            get(calendars::get_calendar)
                .put(calendars::update_calendar)
                .delete(calendars::delete_calendar),
        )
        .route("/calendar/{calendar_id}/public", put(calendars::set_visibility))
        .route("/kougi/insert", post(kougi::insert))
        .route("/kougi/delete", delete(kougi::delete))
        .route("/kougi/get/{calendar_id}", get(kougi::registered))
        .route("/kougi/register_required", post(kougi::register_required))
        .route("/kougi/summary", post(search::summary))
        .route("/search", post(search::search))
        .route("/answer", post(search::answer))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

#[derive(Serialize)]
struct DepartmentList {
    departments: &'static [&'static str],
}

#[derive(Serialize)]
struct SemesterList {
    semesters: &'static [&'static str],
}

async fn departments() -> Json<DepartmentList> {
    Json(DepartmentList {
        departments: DEPARTMENTS,
    })
}

async fn semesters() -> Json<SemesterList> {
    Json(SemesterList {
        semesters: SEMESTERS,
    })
}
