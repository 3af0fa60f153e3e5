//! Integration tests for refresh coordination: single-flight behavior under
//! concurrency and token-store consistency after refresh outcomes.

mod auth_support;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lendkit::auth::{Credentials, TokenStore};

use auth_support::{mock_client, InMemoryTokenStore};

async fn mount_loans_endpoint(server: &MockServer, expired: &str, fresh: &str) {
    Mock::given(method("GET"))
        .and(path("/api/loans/"))
        .and(header("authorization", format!("Bearer {expired}")))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": "Token expired" }))
                .set_delay(Duration::from_millis(20)),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/loans/"))
        .and(header("authorization", format!("Bearer {fresh}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "loans": [] })))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Single-flight refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_401s_trigger_exactly_one_refresh_call() {
    let server = MockServer::start().await;
    mount_loans_endpoint(&server, "expired", "fresh").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .and(header("authorization", "Bearer refresh-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "fresh" }))
                .set_delay(Duration::from_millis(20)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = InMemoryTokenStore::seeded("expired", "refresh-1");
    let client = mock_client(&server, store.clone());

    let (a, b, c) = tokio::join!(
        client.get::<serde_json::Value>("/api/loans/"),
        client.get::<serde_json::Value>("/api/loans/"),
        client.get::<serde_json::Value>("/api/loans/"),
    );
    assert_eq!(a.expect("first call")["loans"], json!([]));
    assert_eq!(b.expect("second call")["loans"], json!([]));
    assert_eq!(c.expect("third call")["loans"], json!([]));
    assert_eq!(store.get().unwrap().access_token, "fresh");
}

#[tokio::test]
async fn concurrent_401s_all_fail_together_when_refresh_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/loans/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": "Token expired" }))
                .set_delay(Duration::from_millis(20)),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "error": "Bad refresh" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = InMemoryTokenStore::seeded("expired", "refresh-1");
    let client = mock_client(&server, store.clone());

    let (a, b) = tokio::join!(
        client.get::<serde_json::Value>("/api/loans/"),
        client.get::<serde_json::Value>("/api/loans/"),
    );
    // Both surface their original 401; nobody retried with a stale token.
    assert_eq!(a.expect_err("must fail").status(), Some(401));
    assert_eq!(b.expect_err("must fail").status(), Some(401));
    assert!(store.get().is_none());
}

#[tokio::test]
async fn coordinator_resets_between_expiry_cycles() {
    let server = MockServer::start().await;
    mount_loans_endpoint(&server, "expired-1", "fresh-1").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .and(header("authorization", "Bearer refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh-1" })))
        .expect(2)
        .mount(&server)
        .await;

    let store = InMemoryTokenStore::seeded("expired-1", "refresh-1");
    let client = mock_client(&server, store.clone());

    let first: serde_json::Value = client.get("/api/loans/").await.expect("first cycle");
    assert_eq!(first["loans"], json!([]));

    // The token expires again later; a second refresh cycle must start cleanly.
    store
        .save(&Credentials::new("expired-1", "refresh-1"))
        .unwrap();
    let second: serde_json::Value = client.get("/api/loans/").await.expect("second cycle");
    assert_eq!(second["loans"], json!([]));
}

// ---------------------------------------------------------------------------
// Token-store consistency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_refresh_clears_both_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/loans/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token expired" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "error": "Bad refresh" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = InMemoryTokenStore::seeded("expired", "rejected-refresh");
    let client = mock_client(&server, store.clone());

    let err = client
        .get::<serde_json::Value>("/api/loans/")
        .await
        .expect_err("must fail");
    assert_eq!(err.status(), Some(401));
    assert!(store.get().is_none());
}

#[tokio::test]
async fn successful_refresh_preserves_refresh_token() {
    let server = MockServer::start().await;
    mount_loans_endpoint(&server, "expired", "fresh").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .and(header("authorization", "Bearer keep-me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = InMemoryTokenStore::seeded("expired", "keep-me");
    let client = mock_client(&server, store.clone());

    client
        .get::<serde_json::Value>("/api/loans/")
        .await
        .expect("refreshed get");

    let credentials = store.get().unwrap();
    assert_eq!(credentials.access_token, "fresh");
    assert_eq!(credentials.refresh_token, "keep-me");
}

#[tokio::test]
async fn missing_refresh_token_fails_without_network_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/loans/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Unauthorized" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryTokenStore::new());
    let client = mock_client(&server, store);

    let err = client
        .get::<serde_json::Value>("/api/loans/")
        .await
        .expect_err("must fail");
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn unmounted_refresh_endpoint_clears_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/loans/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token expired" })))
        .mount(&server)
        .await;
    // No refresh mock mounted: wiremock answers 404, a refresh failure.

    let store = InMemoryTokenStore::seeded("expired", "refresh-1");
    let client = mock_client(&server, store.clone());

    let err = client
        .get::<serde_json::Value>("/api/loans/")
        .await
        .expect_err("must fail");
    assert_eq!(err.status(), Some(401));
    assert!(store.get().is_none());
}
