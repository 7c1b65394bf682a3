//! Scenario tests for the TicketFlow storefront.
//!
//! Each test runs the storefront library against a [`wiremock`] stand-in for
//! the ticketing API, with the session persisted to a temporary directory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ticketflow-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_flow` - Login, restart, logout against the session file
//! - `reservation_flow` - Seat selection and reservation
//! - `checkout_flow` - Payment intent handoff, end to end

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ticketflow_storefront::Storefront;
use ticketflow_storefront::config::StorefrontConfig;

/// Session record for Alice, as the storefront writes it.
pub const ALICE_RECORD: &str =
    r#"{"token":"jwt","user":{"id":"1","email":"alice@example.com","name":"Alice","role":"user"}}"#;

/// A mocked ticketing API plus a scratch directory for the session file.
pub struct TestContext {
    pub server: MockServer,
    dir: TempDir,
}

impl TestContext {
    /// Start a mock server and create the scratch directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        Self {
            server: MockServer::start().await,
            dir,
        }
    }

    /// Where the session record is persisted.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.dir.path().join("ticketing-auth.json")
    }

    /// Configuration pointing at the mock server and the scratch session file.
    ///
    /// # Panics
    ///
    /// Panics if the mock server URI is not a valid URL.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let api_url = Url::parse(&self.server.uri()).expect("mock server URL");
        StorefrontConfig {
            api_url,
            session_path: Some(self.session_path()),
            http_timeout: Duration::from_secs(5),
            ..StorefrontConfig::default()
        }
    }

    /// Build a storefront, restoring whatever session file exists. Calling
    /// this twice simulates a process restart.
    ///
    /// # Panics
    ///
    /// Panics if the storefront cannot be built.
    pub async fn storefront(&self) -> Storefront {
        Storefront::new(self.config())
            .await
            .expect("build storefront")
    }

    /// Write a raw session record before the storefront starts.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn seed_session(&self, record: &str) {
        std::fs::write(self.session_path(), record).expect("write session file");
    }

    /// Contents of the session file, if it exists.
    #[must_use]
    pub fn session_file(&self) -> Option<String> {
        read_optional(&self.session_path())
    }

    /// Answer `POST /auth/login` with Alice's account.
    pub async fn mount_alice_login(&self) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(alice_auth_body()))
            .mount(&self.server)
            .await;
    }

    /// Answer the event and seat lookups for `event_id`.
    pub async fn mount_event(&self, event_id: &str, seats: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/events/{event_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(event_body(event_id)))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/events/{event_id}/seats")))
            .respond_with(ResponseTemplate::new(200).set_body_json(seats))
            .mount(&self.server)
            .await;
    }
}

fn read_optional(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

/// Successful auth response for Alice.
#[must_use]
pub fn alice_auth_body() -> Value {
    json!({
        "token": "jwt",
        "user": {"id": "1", "email": "alice@example.com", "name": "Alice", "role": "user"}
    })
}

/// A minimal event payload.
#[must_use]
pub fn event_body(event_id: &str) -> Value {
    json!({
        "id": event_id,
        "name": "Jazz Night",
        "description": "An evening of standards",
        "imageUrl": null,
        "startDate": "2025-06-15T19:00:00.000Z",
        "endDate": "2025-06-15T22:00:00.000Z",
    })
}
