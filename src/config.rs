//! # Configuration Module
//!
//! Runtime configuration for the order assistant, read from the environment
//! (optionally through a `.env` file loaded in `main`).

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

// Defaults applied when the optional variables are absent
pub const DEFAULT_PORT: u16 = 3010;
pub const DEFAULT_HISTORY_LIMIT: i64 = 20;
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_CONFIRM_KEYWORD: &str = "confirm";
pub const DEFAULT_CANCEL_KEYWORD: &str = "cancel";
pub const DEFAULT_LANGUAGE: &str = "es";

/// Settings for the external text-generation service
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Gemini API key
    pub api_key: String,
    /// Gemini model name, e.g. "gemini-2.5-flash"
    pub model: String,
    /// Upper bound for one generation call in seconds
    pub timeout_secs: u64,
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings that shape a single conversation turn
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Number of most recent messages included in the prompt
    pub history_limit: i64,
    /// Keyword whose presence (case-insensitive) confirms the draft
    pub confirm_keyword: String,
    /// Keyword whose presence (case-insensitive) cancels the draft
    pub cancel_keyword: String,
    /// Language used when the transport does not tell us one
    pub default_language: String,
    /// Upper bound for the oracle call
    pub oracle_timeout: Duration,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            confirm_keyword: DEFAULT_CONFIRM_KEYWORD.to_string(),
            cancel_keyword: DEFAULT_CANCEL_KEYWORD.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            oracle_timeout: Duration::from_secs(DEFAULT_ORACLE_TIMEOUT_SECS),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub port: u16,
    pub oracle: OracleConfig,
    pub turn: TurnConfig,
}

impl AppConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let telegram_bot_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let api_key = env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;

        let port = parse_var("PORT", DEFAULT_PORT)?;
        let timeout_secs = parse_var("ORACLE_TIMEOUT_SECS", DEFAULT_ORACLE_TIMEOUT_SECS)?;
        let history_limit = parse_var("HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?;

        let turn = TurnConfig {
            history_limit,
            confirm_keyword: env::var("CONFIRM_KEYWORD")
                .unwrap_or_else(|_| DEFAULT_CONFIRM_KEYWORD.to_string()),
            cancel_keyword: env::var("CANCEL_KEYWORD")
                .unwrap_or_else(|_| DEFAULT_CANCEL_KEYWORD.to_string()),
            default_language: env::var("DEFAULT_LANGUAGE")
                .unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string()),
            oracle_timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            telegram_bot_token,
            database_url,
            port,
            oracle: OracleConfig {
                api_key,
                model: env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
                timeout_secs,
            },
            turn,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
