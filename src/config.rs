use std::env;
use std::net::SocketAddr;

use crate::answer::AnswerConfig;
use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://syllabus.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_SESSION_TTL_SECS: i64 = 86400;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub session_ttl_secs: i64,
    pub cookie_secure: bool,
    pub answer: Option<AnswerConfig>,
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(v) => v
            .parse::<T>()
            .map_err(|_| AppError::Validation(format!("{name} has an invalid value: {v}"))),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 5u32)?;
        let bind_addr = parse_var(
            "BIND_ADDR",
            DEFAULT_BIND_ADDR
                .parse::<SocketAddr>()
                .map_err(|_| AppError::InternalServerError)?,
        )?;
        let session_ttl_secs = parse_var("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        if session_ttl_secs <= 0 {
            return Err(AppError::Validation("SESSION_TTL_SECS must be positive".to_string()));
        }
        let cookie_secure = parse_var("COOKIE_SECURE", true)?;
        let answer = AnswerConfig::new_from_env()?;

        Ok(Self {
            database_url,
            max_connections,
            bind_addr,
            session_ttl_secs,
            cookie_secure,
            answer,
        })
    }
}
