//! Session persistence across restarts.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use ticketflow_core::input::Credentials;
use ticketflow_integration_tests::{ALICE_RECORD, TestContext, alice_auth_body};
use ticketflow_storefront::error::StorefrontError;
use ticketflow_storefront::session::{AccountView, SessionError};

#[tokio::test]
async fn login_persists_alice_and_survives_restart() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "alice@example.com", "password": "secret123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice_auth_body()))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let storefront = ctx.storefront().await;
    let credentials = Credentials::from_form("alice@example.com", "secret123").unwrap();
    let user = storefront.session().login_with(&credentials).await.unwrap();
    assert_eq!(user.name, "Alice");

    let persisted = ctx.session_file().unwrap();
    assert!(persisted.contains("\"Alice\""));
    assert_eq!(
        storefront.session().identity().await.unwrap().name,
        "Alice"
    );

    // A fresh process sees the same session
    let restarted = ctx.storefront().await;
    let session = restarted.session().snapshot().await;
    assert!(session.is_ready());
    assert_eq!(session.credential().unwrap().expose(), "jwt");
    assert!(matches!(session.account_view(), AccountView::SignedIn(u) if u.name == "Alice"));
}

#[tokio::test]
async fn logout_clears_file_and_memory() {
    let ctx = TestContext::new().await;
    ctx.seed_session(ALICE_RECORD);

    let storefront = ctx.storefront().await;
    assert!(storefront.session().snapshot().await.is_authenticated());

    storefront.session().logout().await.unwrap();
    assert!(ctx.session_file().is_none());
    assert!(!storefront.session().snapshot().await.is_authenticated());

    // Idempotent
    storefront.session().logout().await.unwrap();

    let restarted = ctx.storefront().await;
    assert_eq!(
        restarted.session().snapshot().await.account_view(),
        AccountView::SignedOut
    );
}

#[tokio::test]
async fn malformed_session_files_start_anonymous() {
    let records = [
        r#"{"token":"jwt"}"#,
        r#"{"user":{"id":"1","email":"alice@example.com","name":"Alice","role":"user"}}"#,
        "{not json",
        "",
    ];

    for record in records {
        let ctx = TestContext::new().await;
        ctx.seed_session(record);

        let storefront = ctx.storefront().await;
        let session = storefront.session().snapshot().await;
        assert!(session.is_ready(), "not ready for {record:?}");
        assert!(session.identity().is_none());
        assert!(session.credential().is_none());
        assert!(ctx.session_file().is_none(), "stale file kept for {record:?}");
    }
}

#[tokio::test]
async fn rejected_login_keeps_anonymous_session() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&ctx.server)
        .await;

    let storefront = ctx.storefront().await;
    let credentials = Credentials::from_form("alice@example.com", "wrong").unwrap();
    let err = storefront
        .session()
        .login_with(&credentials)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Api(_)));
    let err = StorefrontError::from(err);
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(!err.is_reportable());
    assert!(ctx.session_file().is_none());
}

#[tokio::test]
async fn invalid_form_never_reaches_the_service() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice_auth_body()))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let err = Credentials::from_form("not-an-email", "secret123").unwrap_err();
    assert_eq!(err.to_string(), "Please enter a valid email and password.");
}
