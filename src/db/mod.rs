pub mod calendars;
pub mod chat;
pub mod courses;
pub mod registrations;
pub mod required;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// File-backed pool in WAL mode. Writers wait on each other for up to
/// `BUSY_TIMEOUT` instead of failing with `SQLITE_BUSY`.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database with the schema applied.
///
/// The connection is never recycled; an in-memory database lives only as long
/// as its connection.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Starts a transaction that holds the write lock from its first statement.
///
/// A deferred transaction that reads before writing cannot be upgraded while
/// another connection writes; SQLite fails it with `SQLITE_BUSY` without
/// consulting the busy timeout.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
