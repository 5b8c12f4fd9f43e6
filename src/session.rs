use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::UserId;

pub type SessionId = String;

/// Server-side session storage. Entries expire after a fixed time-to-live.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// User bound to the session, or `None` when unknown or expired.
    async fn load(&self, session_id: &str) -> Result<Option<UserId>, AppError>;

    /// Binds `user_id` to the session for one TTL.
    async fn save(&self, session_id: &str, user_id: UserId) -> Result<(), AppError>;

    async fn delete(&self, session_id: &str) -> Result<(), AppError>;

    fn ttl(&self) -> Duration;

    fn create_session_id(&self) -> SessionId {
        Uuid::new_v4().to_string()
    }
}

pub struct SqliteSessionStore {
    db: SqlitePool,
    ttl: Duration,
}

impl SqliteSessionStore {
    pub fn new(db: SqlitePool, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Removes expired sessions; returns how many were dropped.
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let now = Utc::now().to_rfc3339();
        let removed = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(now)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(removed)
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<UserId>, AppError> {
        let row: Option<(UserId, String)> =
            sqlx::query_as("SELECT user_id, expires_at FROM sessions WHERE id = ?1")
                .bind(session_id)
                .fetch_optional(&self.db)
                .await?;

        let Some((user_id, expires_at)) = row else {
            return Ok(None);
        };

        let expired = DateTime::parse_from_rfc3339(&expires_at)
            .map(|t| t.with_timezone(&Utc) <= Utc::now())
            .unwrap_or(true);
        if expired {
            self.delete(session_id).await?;
            return Ok(None);
        }
        Ok(Some(user_id))
    }

    async fn save(&self, session_id: &str, user_id: UserId) -> Result<(), AppError> {
        let expires_at = (Utc::now() + self.ttl).to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, expires_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET user_id = excluded.user_id, expires_at = excluded.expires_at
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(session_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
