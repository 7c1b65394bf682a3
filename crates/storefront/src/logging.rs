//! Tracing setup and secret redaction.
//!
//! Everything in this crate logs through `tracing`. Structured fields that may
//! carry request bodies go through [`redact`] first so passwords, bearer
//! tokens and payment secrets never reach a log line or a Sentry breadcrumb.

use std::str::FromStr;

use sentry::integrations::tracing as sentry_tracing;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Environment, StorefrontConfig};

/// Placeholder written in place of a sensitive value.
pub const REDACTED: &str = "[REDACTED]";

/// Key fragments (lowercase) that mark a JSON field as sensitive.
const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "token",
    "authorization",
    "cookie",
    "secret",
    "clientsecret",
    "apikey",
    "accesstoken",
    "refreshtoken",
];

/// Minimum severity that gets emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// `debug` while developing, `info` in production.
    #[must_use]
    pub const fn default_for(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::Info,
            Environment::Development => Self::Debug,
        }
    }

    /// The `EnvFilter` directive for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the configured level
/// applies to TicketFlow crates and everything else is held at `warn`.
/// Warnings and errors are forwarded to Sentry as events, lower levels as
/// breadcrumbs (a no-op when Sentry was not initialized).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(config: &StorefrontConfig, format: LogFormat) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config.log_level));

    let json = format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .try_init()
}

fn default_filter(level: LogLevel) -> EnvFilter {
    let level = level.as_str();
    EnvFilter::new(format!(
        "warn,ticketflow_storefront={level},ticketflow_cli={level}"
    ))
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|fragment| key.contains(fragment))
}

/// Return a copy of `value` with every sensitive field replaced.
///
/// Objects are walked recursively and arrays element by element. A key is
/// sensitive when its lowercase form contains any of the known fragments, so
/// `clientSecret`, `X-Api-Token` and `password_confirm` are all caught.
#[must_use]
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if is_sensitive(k) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Serialize `value` and render it redacted, for use as a log field.
#[must_use]
pub fn redacted_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_value(value).map_or_else(
        |_| "<unserializable>".to_string(),
        |v| redact(&v).to_string(),
    )
}
