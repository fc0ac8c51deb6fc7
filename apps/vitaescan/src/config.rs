use anyhow::{Context, Result};

use crate::analysis::client::{DEFAULT_ANALYSIS_URL, DEFAULT_TIMEOUT_SECS};

const DEFAULT_MAX_UPLOAD_MB: usize = 50;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed numbers fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub analysis_api_url: String,
    pub analysis_timeout_secs: u64,
    /// Without a key the auth guard is off and the routes are open.
    pub firebase_api_key: Option<String>,
    pub max_upload_mb: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            analysis_api_url: std::env::var("ANALYSIS_API_URL")
                .unwrap_or_else(|_| DEFAULT_ANALYSIS_URL.to_string()),
            analysis_timeout_secs: parse_env("ANALYSIS_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            firebase_api_key: std::env::var("FIREBASE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            max_upload_mb: parse_env("MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(analysis_api_url: String) -> Self {
        Config {
            analysis_api_url,
            analysis_timeout_secs: 5,
            firebase_api_key: None,
            max_upload_mb: 1,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
