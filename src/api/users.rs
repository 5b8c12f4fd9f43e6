use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use serde::Serialize;
use tracing::info;

use crate::auth::{
    CurrentUser, expired_session_cookie, hash_password, session_cookie, session_id_from_headers,
    verify_password,
};
use crate::db::users;
use crate::error::AppError;
use crate::models::{Credentials, CurrentUserResponse, UserInfo};
use crate::state::AppState;

const MAX_NAME_LEN: usize = 64;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Serialize)]
pub struct MessageResponse {
    pub detail: &'static str,
}

fn validate(creds: &Credentials) -> Result<(), AppError> {
    let name = creds.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "name must be 1 to {MAX_NAME_LEN} characters"
        )));
    }
    if creds.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<Json<UserInfo>, AppError> {
    validate(&creds)?;
    let name = creds.name.trim();

    if users::find_user_by_name(&state.db, name).await?.is_some() {
        return Err(AppError::Conflict("Name already registered".to_string()));
    }

    let password_hash = hash_password(&creds.password)?;
    let user = users::insert_user(&state.db, name, &password_hash)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Name already registered".to_string())
            }
            other => other.into(),
        })?;

    info!("registered user {}", user.id);
    Ok(Json(UserInfo::from(&user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::find_user_by_name(&state.db, creds.name.trim()).await?;
    let user = match user {
        Some(u) if verify_password(&u.password_hash, &creds.password) => u,
        _ => return Err(AppError::Unauthorized),
    };

    let session_id = state.sessions.create_session_id();
    state.sessions.save(&session_id, user.id).await?;
    let cookie = session_cookie(
        &session_id,
        state.sessions.ttl().num_seconds(),
        state.cookie_secure,
    )?;

    info!("user {} logged in", user.id);
    Ok(([(header::SET_COOKIE, cookie)], Json(UserInfo::from(&user))))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(session_id) = session_id_from_headers(&headers) {
        state.sessions.delete(&session_id).await?;
    }
    Ok((
        [(header::SET_COOKIE, expired_session_cookie()?)],
        Json(MessageResponse {
            detail: "Logged out successfully",
        }),
    ))
}

pub async fn info(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<CurrentUserResponse>, AppError> {
    let user = users::find_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let calendar_info = state.calendars().list_for_user(user_id).await?;

    Ok(Json(CurrentUserResponse {
        user_info: UserInfo::from(&user),
        calendar_info,
    }))
}
