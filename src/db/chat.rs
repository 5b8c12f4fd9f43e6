use sqlx::SqliteExecutor;
use sqlx::types::Json;

use crate::models::{CourseId, UserId};

pub async fn insert_chat<'e, E>(
    db: E,
    user_id: Option<UserId>,
    question: &str,
    generated_query: &str,
    answer: &[CourseId],
) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = sqlx::query(
        r#"
        INSERT INTO chat_logs (user_id, question, generated_query, answer, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(user_id)
    .bind(question)
    .bind(generated_query)
    .bind(Json(answer))
    .bind(super::now())
    .execute(db)
    .await?
    .last_insert_rowid();
    Ok(id)
}
