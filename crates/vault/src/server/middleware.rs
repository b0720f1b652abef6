//! Middleware settings applied to the router.

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

/// Per-request timeout. Generous: uploads and downloads carry whole files.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Allowance for multipart boundaries and part headers on top of the file.
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Content security policy for every response.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; style-src 'self' 'unsafe-inline'; \
     script-src 'self'; img-src 'self' data: https:";

/// Hardening headers added to every response that does not already carry them.
pub fn security_headers() -> [(HeaderName, HeaderValue); 4] {
    [
        (
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
    ]
}

/// CORS policy admitting only the configured browser client.
///
/// Falls back to a same-origin policy when `origin` is not a valid header value.
pub fn cors(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);
    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(origin, "CLIENT_URL is not a valid origin; CORS disabled");
            layer
        }
    }
}
