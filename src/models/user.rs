use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::calendar::{Calendar, CalendarId};

pub type UserId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub def_calendar: Option<CalendarId>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: UserId,
    pub name: String,
    pub def_calendar: Option<CalendarId>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            def_calendar: user.def_calendar,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentUserResponse {
    pub user_info: UserInfo,
    pub calendar_info: Vec<Calendar>,
}
