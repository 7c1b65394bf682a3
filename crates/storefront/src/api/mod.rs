//! Request gateway for the TicketFlow ticketing API.
//!
//! Every call to the remote service goes through [`ApiClient::call`], which
//! owns the cross-cutting concerns:
//!
//! - `Content-Type: application/json` on every request
//! - `Authorization: Bearer <token>` iff a token is supplied
//! - error normalization into [`ApiError`], always carrying a readable message
//! - request/failure logging with request bodies passed through
//!   [`crate::logging::redact`]
//!
//! The gateway neither retries nor caches.
//!
//! # Example
//!
//! ```rust,ignore
//! use ticketflow_storefront::api::ApiClient;
//!
//! let api = ApiClient::from_config(&config)?;
//! let events = api.list_events().await?;
//! let seats = api.event_seats(&events[0].id).await?;
//! ```

pub mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use ticketflow_core::EventId;

use crate::config::StorefrontConfig;
use crate::error::add_breadcrumb;
use crate::logging::redacted_json;

pub use types::*;

/// Message used when a failed response carries nothing more specific.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

// =============================================================================
// Errors
// =============================================================================

/// Broad class of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    Transport,
    /// The service answered with a non-success status.
    Protocol,
    /// A success response whose body did not match the expected shape.
    Decode,
    /// The request could not be built.
    Request,
}

/// Errors that can occur when calling the ticketing API.
///
/// `Display` is the human-readable message, suitable for showing to a user.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure.
    #[error("{0}")]
    Transport(String),

    /// Non-2xx response.
    #[error("{message}")]
    Protocol {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, the status text, or a fallback.
        message: String,
    },

    /// Response body could not be parsed.
    #[error("Unexpected response from ticketing service: {0}")]
    Decode(String),

    /// Request body could not be encoded.
    #[error("Could not encode request: {0}")]
    Encode(String),

    /// Base URL and path did not form a valid URL.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Broad class of this error.
    #[must_use]
    pub const fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Transport(_) => ApiErrorKind::Transport,
            Self::Protocol { .. } => ApiErrorKind::Protocol,
            Self::Decode(_) => ApiErrorKind::Decode,
            Self::Encode(_) | Self::InvalidUrl(_) => ApiErrorKind::Request,
        }
    }

    /// HTTP status, for protocol failures.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether the service rejected the bearer credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Protocol { status: 401, .. })
    }
}

/// Shape of an error body. NestJS-style validators send `message` as a list.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<Value>,
}

/// Pick the message for a failed response.
///
/// A JSON body's `message` wins. A JSON body without a usable `message`
/// yields the generic fallback. A body that is not JSON yields the status
/// text, and the generic fallback when the status has none.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => match parsed.message {
            Some(Value::String(text)) if !text.trim().is_empty() => text,
            Some(Value::Array(items)) if !items.is_empty() => items
                .iter()
                .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_owned))
                .collect::<Vec<_>>()
                .join(","),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        },
        Err(_) => status
            .canonical_reason()
            .filter(|reason| !reason.is_empty())
            .unwrap_or(GENERIC_FAILURE_MESSAGE)
            .to_string(),
    }
}

// =============================================================================
// Bearer credential
// =============================================================================

/// Opaque bearer credential issued by the auth endpoints.
///
/// Never printed: `Debug` is redacted and the raw value is only reachable
/// through [`BearerToken::expose`].
#[derive(Deserialize)]
#[serde(from = "String")]
pub struct BearerToken(SecretString);

impl BearerToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for building the `Authorization` header or persisting.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the token is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl From<String> for BearerToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl Clone for BearerToken {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Method, optional JSON body and optional bearer for one gateway call.
#[derive(Debug)]
pub struct ApiRequest<'a> {
    method: Method,
    body: Option<Value>,
    bearer: Option<&'a BearerToken>,
}

impl<'a> ApiRequest<'a> {
    /// A `GET` without a body.
    #[must_use]
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            body: None,
            bearer: None,
        }
    }

    /// A `POST` carrying `body` as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] if `body` cannot be represented as JSON.
    pub fn post<B: serde::Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(Self {
            method: Method::POST,
            body: Some(body),
            bearer: None,
        })
    }

    /// Authenticate the request with `token`.
    #[must_use]
    pub fn bearer(mut self, token: &'a BearerToken) -> Self {
        self.bearer = Some(token);
        self
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the ticketing API.
///
/// Cheaply cloneable; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ApiClientInner { client, base_url }),
        })
    }

    /// Create a client from storefront configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, ApiError> {
        Self::new(config.api_url.clone(), config.http_timeout)
    }

    /// Base URL every path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        // Plain concatenation keeps any path prefix on the base URL
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}")).map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    /// Send one request and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-2xx status, or an
    /// undecodable body.
    #[instrument(skip(self, path, request), fields(method = %request.method, path = %path))]
    pub async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        request: ApiRequest<'_>,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;

        debug!(
            authenticated = request.bearer.is_some(),
            body = %request.body.as_ref().map_or_else(String::new, redacted_json),
            "API request"
        );

        let mut builder = self
            .inner
            .client
            .request(request.method.clone(), url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = request.bearer {
            builder = builder.bearer_auth(token.expose());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = ApiError::Transport(e.to_string());
                record_failure(&request.method, path, &err);
                return Err(err);
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                let err = ApiError::Transport(e.to_string());
                record_failure(&request.method, path, &err);
                return Err(err);
            }
        };

        if !status.is_success() {
            let err = ApiError::Protocol {
                status: status.as_u16(),
                message: error_message(status, &body),
            };
            record_failure(&request.method, path, &err);
            return Err(err);
        }

        debug!(status = status.as_u16(), "API response");

        serde_json::from_slice(&body).map_err(|e| {
            let err = ApiError::Decode(e.to_string());
            record_failure(&request.method, path, &err);
            err
        })
    }

    // =========================================================================
    // Endpoints
    // =========================================================================

    /// `GET /health`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the service is unreachable or unhealthy.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.call("/health", ApiRequest::get()).await
    }

    /// `POST /auth/register`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if registration is rejected or the call fails.
    pub async fn register(&self, body: &RegisterRequest<'_>) -> Result<AuthResponse, ApiError> {
        self.call("/auth/register", ApiRequest::post(body)?).await
    }

    /// `POST /auth/login`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the credentials are rejected or the call fails.
    pub async fn login(&self, body: &LoginRequest<'_>) -> Result<AuthResponse, ApiError> {
        self.call("/auth/login", ApiRequest::post(body)?).await
    }

    /// `GET /events`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.call("/events", ApiRequest::get()).await
    }

    /// `GET /events/:id`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the event does not exist or the call fails.
    pub async fn get_event(&self, id: &EventId) -> Result<Event, ApiError> {
        let path = format!("/events/{}", urlencoding::encode(id.as_str()));
        self.call(&path, ApiRequest::get()).await
    }

    /// `GET /events/:id/seats`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn event_seats(&self, id: &EventId) -> Result<Vec<Seat>, ApiError> {
        let path = format!("/events/{}/seats", urlencoding::encode(id.as_str()));
        self.call(&path, ApiRequest::get()).await
    }

    /// `POST /reservations` (bearer-authenticated)
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if any seat is no longer available, the token is
    /// rejected, or the call fails.
    pub async fn create_reservation(
        &self,
        body: &ReservationRequest,
        token: &BearerToken,
    ) -> Result<ReservationResponse, ApiError> {
        self.call("/reservations", ApiRequest::post(body)?.bearer(token))
            .await
    }

    /// `POST /orders/checkout`
    ///
    /// Sent without a bearer credential; the service does not require one
    /// for this endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn checkout(&self, body: &CheckoutRequest) -> Result<CheckoutResponse, ApiError> {
        self.call("/orders/checkout", ApiRequest::post(body)?).await
    }
}

/// Log a failed call and leave a Sentry breadcrumb.
fn record_failure(method: &Method, path: &str, err: &ApiError) {
    let status = err.status().map_or_else(|| "-".to_string(), |s| s.to_string());
    warn!(
        method = %method,
        path = %path,
        status = %status,
        error = %err,
        "API request failed"
    );
    add_breadcrumb(
        "api",
        "Ticketing API request failed",
        Some(&[
            ("method", method.as_str()),
            ("path", path),
            ("status", status.as_str()),
        ]),
    );
}
