//! CORS edge filter.
//!
//! Every request whose path falls under the configured prefix is
//! *intercepted*: its response, whatever the method or status, gets the
//! permissive cross-origin headers below. Other paths pass through untouched.
//! The filter never looks at bodies and never rejects a request.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// What the filter does with a given request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    PassThrough,
    Intercepted,
}

/// Path-prefix rule deciding which responses get CORS headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    /// Normalized: leading slash, no trailing slash. Empty means "everything".
    path_prefix: String,
}

impl CorsPolicy {
    /// Build a policy for `prefix`, e.g. `/api` or `/api/`.
    pub fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim().trim_end_matches('/');
        let path_prefix = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };
        Self { path_prefix }
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// `/api` and `/api/...` are intercepted; `/apiary` is not.
    pub fn classify(&self, path: &str) -> FilterState {
        if self.path_prefix.is_empty() {
            return FilterState::Intercepted;
        }
        match path.strip_prefix(&self.path_prefix) {
            Some("") => FilterState::Intercepted,
            Some(rest) if rest.starts_with('/') => FilterState::Intercepted,
            _ => FilterState::PassThrough,
        }
    }
}

/// Attach the three CORS headers, replacing any existing values.
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// CORS middleware for HTTP requests.
pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let state = policy.classify(request.uri().path());
    let mut response = next.run(request).await;
    if state == FilterState::Intercepted {
        apply_cors_headers(response.headers_mut());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prefix_and_children() {
        let policy = CorsPolicy::new("/api");
        assert_eq!(policy.classify("/api"), FilterState::Intercepted);
        assert_eq!(policy.classify("/api/"), FilterState::Intercepted);
        assert_eq!(policy.classify("/api/health"), FilterState::Intercepted);
        assert_eq!(
            policy.classify("/api/employees/delete-all"),
            FilterState::Intercepted
        );
    }

    #[test]
    fn test_classify_outside_prefix() {
        let policy = CorsPolicy::new("/api");
        assert_eq!(policy.classify("/"), FilterState::PassThrough);
        assert_eq!(policy.classify("/apiary"), FilterState::PassThrough);
        assert_eq!(policy.classify("/static/app.js"), FilterState::PassThrough);
    }

    #[test]
    fn test_prefix_normalization() {
        assert_eq!(CorsPolicy::new("/api/").path_prefix(), "/api");
        assert_eq!(CorsPolicy::new("api").path_prefix(), "/api");
        assert_eq!(CorsPolicy::new(" /v1/api/ ").path_prefix(), "/v1/api");
    }

    #[test]
    fn test_root_prefix_intercepts_everything() {
        let policy = CorsPolicy::new("/");
        assert_eq!(policy.classify("/"), FilterState::Intercepted);
        assert_eq!(policy.classify("/anything"), FilterState::Intercepted);
    }

    #[test]
    fn test_apply_headers_overwrites() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("https://crm.example.com"),
        );
        apply_cors_headers(&mut headers);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
    }
}
