//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::PayloadTooLarge`] → 413
/// - [`ServiceError::IntegrityFailure`] → 500
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed, e.g. a multipart body without a `file` field.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The object does not exist, or its ciphertext is gone.
    #[error("not found: {0}")]
    NotFound(String),

    /// The upload exceeds the configured size ceiling.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Stored ciphertext failed authentication on decrypt.
    #[error("integrity failure: {0}")]
    IntegrityFailure(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::PayloadTooLarge(_) => 413,
            ServiceError::IntegrityFailure(_) => 500,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::PayloadTooLarge(_) => "payload_too_large",
            ServiceError::IntegrityFailure(_) => "integrity_failure",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}
