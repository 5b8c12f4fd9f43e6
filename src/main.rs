use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use syllabus_backend::answer::{AnswerClient, HttpAnswerClient, NoopAnswerClient};
use syllabus_backend::api::router;
use syllabus_backend::config::AppConfig;
use syllabus_backend::db;
use syllabus_backend::session::SqliteSessionStore;
use syllabus_backend::state::AppState;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "syllabus_backend=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = db::connect(&config.database_url, config.max_connections).await?;

    let sessions = Arc::new(SqliteSessionStore::new(
        pool.clone(),
        chrono::Duration::seconds(config.session_ttl_secs),
    ));

    let answers: Arc<dyn AnswerClient> = match config.answer.clone() {
        Some(answer_config) => {
            info!("answer service at {}", answer_config.api_url);
            Arc::new(HttpAnswerClient::new(answer_config)?)
        }
        None => {
            info!("ANSWER_API_URL not set, answer endpoint echoes filtered candidates");
            Arc::new(NoopAnswerClient)
        }
    };

    let purger = sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match purger.purge_expired().await {
                Ok(0) => {}
                Ok(n) => info!("purged {} expired sessions", n),
                Err(e) => error!("session purge failed: {}", e),
            }
        }
    });

    let state = AppState::new(pool, sessions, answers, config.cookie_secure);
    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
