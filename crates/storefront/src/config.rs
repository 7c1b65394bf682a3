//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `TICKETFLOW_API_URL` - Base URL of the ticketing API (default: `http://localhost:3001`)
//! - `TICKETFLOW_ENV` - Deployment environment; `production` raises the default log level
//! - `TICKETFLOW_LOG_LEVEL` - Minimum log severity (`debug|info|warn|error`), falls back to `LOG_LEVEL`
//! - `TICKETFLOW_SESSION_PATH` - Where the session record is persisted
//! - `TICKETFLOW_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::logging::LogLevel;

/// Default ticketing API location for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// File name of the persisted session record.
pub const SESSION_FILE_NAME: &str = "ticketing-auth.json";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the ticketing API
    pub api_url: Url,
    /// Deployment environment
    pub environment: Environment,
    /// Minimum log severity
    pub log_level: LogLevel,
    /// Explicit session file location (platform data dir when unset)
    pub session_path: Option<PathBuf>,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            environment: Environment::Development,
            log_level: LogLevel::default_for(Environment::Development),
            session_path: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_optional_env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = match get_optional_env("TICKETFLOW_API_URL") {
            Some(raw) => Url::parse(raw.trim()).map_err(|e| {
                ConfigError::InvalidEnvVar("TICKETFLOW_API_URL".to_string(), e.to_string())
            })?,
            None => default_api_url(),
        };

        let environment = Environment::parse(get_optional_env("TICKETFLOW_ENV").as_deref());

        // An unrecognised level is not fatal; the environment default applies
        let log_level = get_optional_env("TICKETFLOW_LOG_LEVEL")
            .or_else(|| get_optional_env("LOG_LEVEL"))
            .and_then(|v| v.parse::<LogLevel>().ok())
            .unwrap_or_else(|| LogLevel::default_for(environment));

        let http_timeout = match get_optional_env("TICKETFLOW_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "TICKETFLOW_HTTP_TIMEOUT_SECS".to_string(),
                    e.to_string(),
                )
            })?),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            environment,
            log_level,
            session_path: get_optional_env("TICKETFLOW_SESSION_PATH").map(PathBuf::from),
            http_timeout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Where the session record lives on disk.
    ///
    /// Uses `TICKETFLOW_SESSION_PATH` when set, otherwise the platform data
    /// directory, otherwise the working directory.
    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        if let Some(path) = &self.session_path {
            return path.clone();
        }
        directories::ProjectDirs::from("com", "TicketFlow", "ticketflow").map_or_else(
            || PathBuf::from(SESSION_FILE_NAME),
            |dirs| dirs.data_dir().join(SESSION_FILE_NAME),
        )
    }
}

fn default_api_url() -> Url {
    // Constant input, parse cannot fail
    Url::parse(DEFAULT_API_URL).expect("default API URL is valid")
}
