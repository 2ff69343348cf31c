//! Integration tests for the CORS edge filter, driven through the full router.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use crm_admin_api::build_router;
use crm_admin_api::config::DatabaseSettings;
use crm_admin_api::db::ConnectionProvider;
use crm_admin_api::diagnostics::EnvSnapshot;
use crm_admin_api::http::AppState;
use crm_admin_api::http::cors::{ALLOW_HEADERS, ALLOW_METHODS, CorsPolicy};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Router whose database is unreachable; CORS behavior must not depend on it.
fn app(prefix: &str) -> Router {
    let settings = DatabaseSettings {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..DatabaseSettings::defaults()
    };
    let provider = ConnectionProvider::new(settings, Duration::from_secs(2), Duration::from_secs(2));
    let state = Arc::new(AppState::new(provider, EnvSnapshot::default()));
    build_router(state, CorsPolicy::new(prefix))
}

async fn send(app: Router, method: &str, uri: &str) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::ORIGIN, "https://crm.example.com")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

fn assert_has_cors(response: &axum::response::Response) {
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
}

fn assert_no_cors(response: &axum::response::Response) {
    let headers = response.headers();
    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).is_none());
    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).is_none());
}

#[tokio::test]
async fn test_api_success_response_gets_headers() {
    let response = send(app("/api"), "GET", "/api/check-env").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_has_cors(&response);
}

#[tokio::test]
async fn test_api_error_response_gets_headers() {
    // Database is unreachable, so health answers 500
    let response = send(app("/api"), "GET", "/api/health").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_has_cors(&response);
}

#[tokio::test]
async fn test_unknown_api_route_gets_headers() {
    let response = send(app("/api"), "GET", "/api/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_has_cors(&response);
}

#[tokio::test]
async fn test_wrong_method_gets_headers() {
    let response = send(app("/api"), "GET", "/api/employees/delete-all").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_has_cors(&response);
}

#[tokio::test]
async fn test_preflight_is_not_short_circuited() {
    let response = send(app("/api"), "OPTIONS", "/api/employees/delete-all").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_has_cors(&response);
}

#[tokio::test]
async fn test_paths_outside_prefix_pass_through() {
    for uri in ["/", "/health", "/apiary", "/static/app.js"] {
        let response = send(app("/api"), "GET", uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri: {uri}");
        assert_no_cors(&response);
    }
}

#[tokio::test]
async fn test_custom_prefix() {
    let response = send(app("/internal"), "GET", "/api/check-env").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_no_cors(&response);

    let response = send(app("/internal"), "GET", "/internal/anything").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_has_cors(&response);
}
