use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Base URL of the profile service. Unset means an in-memory store.
    pub profile_service_url: Option<String>,
    pub profile_service_token: Option<String>,
    pub autosave_quiet: Duration,
    pub notification_backlog: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_or("PORT", optional_env("PORT"), 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            profile_service_url: optional_env("PROFILE_SERVICE_URL"),
            profile_service_token: optional_env("PROFILE_SERVICE_TOKEN"),
            autosave_quiet: Duration::from_millis(parse_or(
                "AUTOSAVE_QUIET_MS",
                optional_env("AUTOSAVE_QUIET_MS"),
                5000,
            )?),
            notification_backlog: parse_or(
                "NOTIFICATION_BACKLOG",
                optional_env("NOTIFICATION_BACKLOG"),
                50,
            )?,
        })
    }
}

/// Reads `key`, treating unset and blank the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        None => Ok(default),
    }
}
