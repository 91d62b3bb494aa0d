//! Integration tests for the stockboard API client and login flow

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use stockboard_core::api::{RequestInterceptor, ResponseInterceptor};
use stockboard_core::auth::{FileTokenStore, MemoryTokenStore};
use stockboard_core::navigation::RecordingNavigator;
use stockboard_core::{ApiClient, ApiError, AuthError, AuthService, Config, Credentials, TokenStore};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    store: Arc<MemoryTokenStore>,
    nav: Arc<RecordingNavigator>,
    api: ApiClient,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::new());
    let nav = Arc::new(RecordingNavigator::new());
    let config = Config {
        base_url: server.uri(),
        ..Config::default()
    };
    let api = ApiClient::builder(config)
        .token_store(store.clone())
        .navigator(nav.clone())
        .build()
        .unwrap();
    Harness {
        server,
        store,
        nav,
        api,
    }
}

#[tokio::test]
async fn test_bearer_header_when_token_present() {
    let h = harness().await;
    h.store.set("abc123").unwrap();

    Mock::given(method("GET"))
        .and(path("/stocks"))
        .and(header("authorization", "Bearer abc123"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"symbol": "AAPL"}])))
        .expect(1)
        .mount(&h.server)
        .await;

    let stocks: Value = h.api.get("/stocks").await.unwrap();
    assert_eq!(stocks[0]["symbol"], "AAPL");
}

#[tokio::test]
async fn test_no_authorization_without_token() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/market"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"open": true})))
        .mount(&h.server)
        .await;

    let _: Value = h.api.get("/market").await.unwrap();

    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_unauthorized_clears_token_and_navigates_once() {
    let h = harness().await;
    h.store.set("expired").unwrap();

    Mock::given(method("GET"))
        .and(path("/backtest"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Could not validate credentials"})),
        )
        .mount(&h.server)
        .await;

    let err = h.api.get::<Value>("/backtest").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(err.detail().as_deref(), Some("Could not validate credentials"));
    assert_eq!(h.store.get().unwrap(), None);
    assert_eq!(h.nav.routes(), vec!["/login"]);
}

#[tokio::test]
async fn test_other_statuses_leave_session_alone() {
    let h = harness().await;
    h.store.set("keep-me").unwrap();

    for (route, status) in [("/ok", 200), ("/missing", 404), ("/boom", 500), ("/denied", 403)] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({})))
            .mount(&h.server)
            .await;
    }

    assert!(h.api.get::<Value>("/ok").await.is_ok());
    assert!(matches!(
        h.api.get::<Value>("/missing").await,
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        h.api.get::<Value>("/boom").await,
        Err(ApiError::ServerError(_))
    ));
    assert!(matches!(
        h.api.get::<Value>("/denied").await,
        Err(ApiError::AccessDenied(_))
    ));

    assert_eq!(h.store.get().unwrap().as_deref(), Some("keep-me"));
    assert_eq!(h.nav.count(), 0);
}

#[tokio::test]
async fn test_login_persists_access_token() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"user": "a", "pass": "b"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "XYZ", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let auth = AuthService::new(h.api.clone());
    let token = auth.login(&json!({"user": "a", "pass": "b"})).await.unwrap();

    assert_eq!(token, "XYZ");
    assert_eq!(auth.get_token().as_deref(), Some("XYZ"));
    assert!(auth.is_authenticated());
}

#[tokio::test]
async fn test_login_then_requests_carry_token() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "XYZ"})))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/backtest2000"))
        .and(header("authorization", "Bearer XYZ"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"return": 0.12})))
        .expect(1)
        .mount(&h.server)
        .await;

    let auth = AuthService::new(h.api.clone());
    auth.login(&Credentials::new("alice", "secret")).await.unwrap();

    let result: Value = h.api.get("backtest2000").await.unwrap();
    assert_eq!(result["return"], 0.12);
}

#[tokio::test]
async fn test_login_failure_uses_detail() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "bad credentials"})))
        .mount(&h.server)
        .await;

    let auth = AuthService::new(h.api.clone());
    let err = auth.login(&Credentials::new("a", "wrong")).await.unwrap_err();

    assert!(matches!(err, AuthError::Authentication(_)));
    assert_eq!(err.to_string(), "bad credentials");
    assert!(!auth.is_authenticated());
    // The login call went through the 401 handler like any other request
    assert_eq!(h.nav.count(), 1);
}

#[tokio::test]
async fn test_login_failure_detail_in_long_body() {
    let h = harness().await;
    let body = json!({"detail": "bad credentials", "trace": "x".repeat(600)});

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(body))
        .mount(&h.server)
        .await;

    let auth = AuthService::new(h.api.clone());
    let err = auth.login(&Credentials::new("a", "b")).await.unwrap_err();
    assert_eq!(err.to_string(), "bad credentials");
}

#[tokio::test]
async fn test_login_failure_default_message() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&h.server)
        .await;

    let auth = AuthService::new(h.api.clone());
    let err = auth.login(&Credentials::new("a", "b")).await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed");
    assert_eq!(h.nav.count(), 0);
}

#[tokio::test]
async fn test_login_malformed_success_body() {
    let h = harness().await;
    h.store.set("previous").unwrap();

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "wrong-field"})))
        .mount(&h.server)
        .await;

    let auth = AuthService::new(h.api.clone());
    let err = auth.login(&Credentials::new("a", "b")).await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed");
    assert_eq!(auth.get_token().as_deref(), Some("previous"));
}

#[tokio::test]
async fn test_logout_regardless_of_state() {
    let h = harness().await;
    let auth = AuthService::new(h.api.clone());

    auth.logout().unwrap();
    assert_eq!(auth.get_token(), None);
    assert!(!auth.is_authenticated());

    h.store.set("abc").unwrap();
    assert!(auth.is_authenticated());
    auth.logout().unwrap();
    assert_eq!(auth.get_token(), None);
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_file_store_survives_new_client() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "persisted"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stocks"))
        .and(header("authorization", "Bearer persisted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let first = ApiClient::new(server.uri(), Arc::new(FileTokenStore::new(dir.path(), "token"))).unwrap();
    AuthService::new(first).login(&Credentials::new("a", "b")).await.unwrap();

    let second = ApiClient::new(server.uri(), Arc::new(FileTokenStore::new(dir.path(), "token"))).unwrap();
    let stocks: Vec<Value> = second.get("/stocks").await.unwrap();
    assert!(stocks.is_empty());
}

#[tokio::test]
async fn test_empty_body_and_raw_send() {
    let h = harness().await;

    Mock::given(method("DELETE"))
        .and(path("/stocks/AAPL"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/stocks/AAPL"))
        .and(body_json(json!({"watch": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"symbol": "AAPL", "watch": true})))
        .mount(&h.server)
        .await;

    let deleted: Option<Value> = h.api.delete("/stocks/AAPL").await.unwrap();
    assert!(deleted.is_none());

    let body = json!({"watch": true});
    let updated = h.api.send(Method::PUT, "/stocks/AAPL", Some(&body)).await.unwrap();
    assert_eq!(updated["watch"], true);
}

#[tokio::test]
async fn test_invalid_json_is_invalid_response() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/market"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&h.server)
        .await;

    let err = h.api.get::<Value>("/market").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_network_error_passes_through() {
    // Bind then release a port so nothing is listening on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let store = Arc::new(MemoryTokenStore::with_token("abc"));
    let nav = Arc::new(RecordingNavigator::new());
    let config = Config {
        base_url: uri,
        ..Config::default()
    };
    let api = ApiClient::builder(config)
        .token_store(store.clone())
        .navigator(nav.clone())
        .build()
        .unwrap();

    let err = api.get::<Value>("/stocks").await.unwrap_err();
    assert!(matches!(err, ApiError::NetworkError(_)));
    assert_eq!(store.get().unwrap().as_deref(), Some("abc"));
    assert_eq!(nav.count(), 0);
}

struct TraceHeader;

impl RequestInterceptor for TraceHeader {
    fn on_request(&self, headers: &mut HeaderMap) {
        headers.insert("x-client", "stockboard".parse().unwrap());
    }
}

#[derive(Default)]
struct StatusCounter(AtomicUsize);

impl ResponseInterceptor for StatusCounter {
    fn on_response(&self, _status: StatusCode) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_custom_interceptors() {
    let server = MockServer::start().await;
    let counter = Arc::new(StatusCounter::default());

    Mock::given(method("GET"))
        .and(path("/stocks"))
        .and(header("x-client", "stockboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/market"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = Config {
        base_url: server.uri(),
        ..Config::default()
    };
    let api = ApiClient::builder(config)
        .request_interceptor(Arc::new(TraceHeader))
        .response_interceptor(counter.clone())
        .build()
        .unwrap();

    let _: Value = api.get("/stocks").await.unwrap();
    let _ = api.get::<Value>("/market").await;
    assert_eq!(counter.0.load(Ordering::SeqCst), 2);
}
