use std::env;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

use crate::actors::llm::{GeminiSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::error::AppError;
use crate::quota::DEFAULT_DAILY_LIMIT;

const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 3000;

/// Server configuration, read from the environment.
#[derive(Debug, Clone, Validate)]
pub struct AppConfig {
    /// `None` leaves the remote classifier unconfigured; prompts then use the local heuristic.
    pub gemini_api_key: Option<String>,
    #[validate(length(min = 1))]
    pub gemini_model: String,
    #[validate(url)]
    pub gemini_base_url: String,
    #[validate(range(min = 1, max = 300))]
    pub remote_timeout_secs: u64,
    #[validate(range(min = 1))]
    pub session_daily_limit: u32,
    /// SQLite URL for the usage record. `None` keeps it in memory.
    pub database_url: Option<String>,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            remote_timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
            session_daily_limit: DEFAULT_DAILY_LIMIT,
            database_url: None,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        let config = Self {
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_model: non_empty_var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: non_empty_var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            remote_timeout_secs: parsed_var("REMOTE_TIMEOUT_SECS")?
                .unwrap_or(defaults.remote_timeout_secs),
            session_daily_limit: parsed_var("SESSION_DAILY_LIMIT")?
                .unwrap_or(defaults.session_daily_limit),
            database_url: non_empty_var("DATABASE_URL"),
            port: parsed_var("PORT")?.unwrap_or(defaults.port),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            api_key: self.gemini_api_key.clone(),
            base_url: self.gemini_base_url.clone(),
            model: self.gemini_model.clone(),
            timeout: self.remote_timeout(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T>(name: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty_var(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| AppError::Config(format!("{} must be a number ('{}'): {}", name, raw, e)))
        })
        .transpose()
}
