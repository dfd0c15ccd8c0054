//! Tests for the HTTP client module

use super::*;
use crate::auth::{SessionEvent, REFRESH_PATH};
use crate::error::Error;
use crate::session::{MemorySessionStore, Session, SessionStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, store: Arc<MemorySessionStore>) -> AuthenticatedHttpClient {
    let config = HttpClientConfig::builder().base_url(server.uri()).build();
    AuthenticatedHttpClient::new(config, store).unwrap()
}

fn logged_in(token: &str) -> Arc<MemorySessionStore> {
    Arc::new(MemorySessionStore::with_session(Session::new(token, None)))
}

async fn mount_refresh(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": token })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.base_url.is_none());
    assert_eq!(config.refresh_path, "/api/auth/refresh");
    assert_eq!(
        config.default_headers.get("Content-Type"),
        Some(&"application/json".to_string())
    );
    assert!(config.user_agent.starts_with("storefront-client/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com")
        .refresh_path("/auth/renew")
        .timeout(Duration::from_secs(60))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, Some("https://api.example.com".to_string()));
    assert_eq!(config.refresh_path, "/auth/renew");
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_request_config_builder() {
    let config = RequestConfig::new()
        .query("page", "1")
        .header("X-Request-Id", "abc123")
        .json(json!({"key": "value"}))
        .timeout(Duration::from_secs(10));

    assert_eq!(config.query.get("page"), Some(&"1".to_string()));
    assert_eq!(
        config.headers.get("X-Request-Id"),
        Some(&"abc123".to_string())
    );
    assert!(config.body.is_some());
    assert_eq!(config.timeout, Some(Duration::from_secs(10)));
    assert!(!config.retried);
    assert!(!config.skip_refresh);

    let config = config.as_retry().skip_refresh();
    assert!(config.retried);
    assert!(config.skip_refresh);
}

#[tokio::test]
async fn test_build_url() {
    let config = HttpClientConfig::builder()
        .base_url("http://localhost:8080/")
        .build();
    let client = AuthenticatedHttpClient::new(config, Arc::new(MemorySessionStore::new())).unwrap();

    assert_eq!(client.build_url("/api/cart"), "http://localhost:8080/api/cart");
    assert_eq!(client.build_url("api/cart"), "http://localhost:8080/api/cart");
    assert_eq!(
        client.build_url("https://cdn.example.com/x"),
        "https://cdn.example.com/x"
    );
    assert_eq!(
        client.coordinator().refresh_url(),
        "http://localhost:8080/api/auth/refresh"
    );
}

// ============================================================================
// Request Tests
// ============================================================================

#[tokio::test]
async fn test_attaches_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/orders/me"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, logged_in("abc"));
    let orders: serde_json::Value = client.get_json("/api/orders/me").await.unwrap();

    assert_eq!(orders[0]["id"], 1);
}

#[tokio::test]
async fn test_no_token_sends_no_authorization_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Arc::new(MemorySessionStore::new()));
    client.get("/api/products").await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_post_put_delete_with_body_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/cart/items"))
        .and(body_json(json!({ "variantId": 9, "quantity": 2 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "items": 1 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/cart/items/9"))
        .and(body_json(json!({ "quantity": 3 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/cart/items/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/orders/me"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, logged_in("abc"));

    let created: serde_json::Value = client
        .post_json("/api/cart/items", json!({ "variantId": 9, "quantity": 2 }))
        .await
        .unwrap();
    assert_eq!(created["items"], 1);

    client
        .put("/api/cart/items/9", json!({ "quantity": 3 }))
        .await
        .unwrap();
    let response = client.delete("/api/cart/items/9").await.unwrap();
    assert_eq!(response.status(), 204);

    client
        .get_with_config("/api/orders/me", RequestConfig::new().query("page", "2"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_non_auth_errors_are_not_refreshed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/orders/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such order"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    mount_refresh(&mock_server, "never", 0).await;

    let client = client_for(&mock_server, logged_in("abc"));

    let err = client.get("/api/orders/404").await.unwrap_err();
    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such order");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = client.get("/api/admin/users").await.unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_transport_error_propagates() {
    let config = HttpClientConfig::builder()
        .base_url("http://127.0.0.1:9")
        .build();
    let client = AuthenticatedHttpClient::new(config, logged_in("abc")).unwrap();

    let err = client.get("/api/cart").await.unwrap_err();
    assert!(matches!(err, Error::Http(_)));
    assert_eq!(client.coordinator().refresh_calls(), 0);
}

// ============================================================================
// Refresh-on-401 Tests
// ============================================================================

#[tokio::test]
async fn test_401_refreshes_and_replays() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(header("Authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(header("Authorization", "Bearer renewed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_refresh(&mock_server, "renewed", 1).await;

    let store = logged_in("expired");
    let client = client_for(&mock_server, store.clone());
    let mut rx = client.subscribe();

    let cart: serde_json::Value = client.get_json("/api/cart").await.unwrap();
    assert_eq!(cart["items"], json!([]));

    assert_eq!(
        store.access_token().await.unwrap(),
        Some("renewed".to_string())
    );
    assert!(!client.coordinator().is_refreshing());
    assert_eq!(rx.try_recv().unwrap(), SessionEvent::Refreshed);
}

#[tokio::test]
async fn test_replay_keeps_body_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(header("Authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(header("Authorization", "Bearer renewed"))
        .and(header("X-Idempotency-Key", "order-1"))
        .and(body_json(json!({ "addressId": 5 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 77 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_refresh(&mock_server, "renewed", 1).await;

    let client = client_for(&mock_server, logged_in("expired"));
    let order: serde_json::Value = client
        .request_json(
            reqwest::Method::POST,
            "/api/orders",
            RequestConfig::new()
                .header("X-Idempotency-Key", "order-1")
                .json(json!({ "addressId": 5 })),
        )
        .await
        .unwrap();

    assert_eq!(order["id"], 77);
}

#[tokio::test]
async fn test_already_retried_request_is_not_refreshed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_refresh(&mock_server, "never", 0).await;

    let client = client_for(&mock_server, logged_in("expired"));
    let err = client
        .get_with_config("/api/cart", RequestConfig::new().as_retry())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Unauthorized { ref body } if body == "token expired"));
    assert_eq!(client.coordinator().refresh_calls(), 0);
}

#[tokio::test]
async fn test_skip_refresh_request_is_not_refreshed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    mount_refresh(&mock_server, "never", 0).await;

    let client = client_for(&mock_server, logged_in("expired"));
    let err = client
        .get_with_config("/api/cart", RequestConfig::new().skip_refresh())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Unauthorized { .. }));
}

#[tokio::test]
async fn test_unauthenticated_401_still_tries_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/addresses"))
        .and(header("Authorization", "Bearer from-cookie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/addresses"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    mount_refresh(&mock_server, "from-cookie", 1).await;

    let store = Arc::new(MemorySessionStore::new());
    let client = client_for(&mock_server, store.clone());

    client.get("/api/addresses").await.unwrap();
    assert_eq!(
        store.access_token().await.unwrap(),
        Some("from-cookie".to_string())
    );
}
