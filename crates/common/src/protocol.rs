//! Request and response types exchanged over the public HTTP API.
//!
//! Field names are camelCase on the wire to match what the browser client
//! already consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Object descriptors
// ---------------------------------------------------------------------------

/// Client-visible view of one stored object.
///
/// Returned by `POST /api/upload` and, as a list, by `GET /api/files`. The
/// ciphertext locator is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Opaque object id used in download and delete URLs.
    pub id: String,
    /// Name supplied by the uploader. Untrusted.
    pub original_name: String,
    /// Plaintext length in bytes.
    pub size: u64,
    /// Content type supplied by the uploader. Informational only.
    pub mime_type: String,
    /// Creation time of the object.
    pub upload_date: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Delete endpoint
// ---------------------------------------------------------------------------

/// Response body for `DELETE /api/files/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Always `true` on a 2xx response.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"not_found"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(err: &crate::ServiceError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Server time at which the check ran.
    pub timestamp: DateTime<Utc>,
    /// Number of objects currently in the catalog, if it could be read.
    pub objects: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_uses_camel_case_fields() {
        let d = FileDescriptor {
            id: "1700000000000-abcd".into(),
            original_name: "report.pdf".into(),
            size: 42,
            mime_type: "application/pdf".into(),
            upload_date: Utc::now(),
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["originalName"], "report.pdf");
        assert_eq!(json["mimeType"], "application/pdf");
        assert!(json.get("uploadDate").is_some());
        assert!(json.get("encryptedPath").is_none());
    }

    #[test]
    fn error_response_from_service_error() {
        let e = crate::ServiceError::NotFound("file not found".into());
        let body = ErrorResponse::from(&e);
        assert_eq!(body.code, "not_found");
        assert!(body.message.contains("file not found"));
    }

    #[test]
    fn health_response_serde() {
        let h = HealthResponse {
            status: "ok".into(),
            timestamp: Utc::now(),
            objects: Some(3),
        };
        let json = serde_json::to_string(&h).unwrap();
        let decoded: HealthResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.objects, Some(3));
    }
}
