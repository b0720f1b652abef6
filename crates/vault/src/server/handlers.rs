//! Axum request handlers for all service endpoints.

use std::io;

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use common::protocol::{DeleteResponse, ErrorResponse, FileDescriptor, HealthResponse};
use common::ServiceError;
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use super::state::AppState;
use crate::error::VaultError;
use crate::lifecycle::{DEFAULT_MIME_TYPE, DEFAULT_NAME};
use crate::object::ObjectId;

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Error type returned by handlers; renders as an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError(ServiceError);

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        let svc = ServiceError::from(&err);
        if svc.http_status() >= 500 {
            warn!(error = %err, "request failed");
        } else {
            debug!(error = %err, "request rejected");
        }
        ApiError(svc)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError(ServiceError::PayloadTooLarge(err.body_text()))
        } else {
            ApiError(ServiceError::BadRequest(err.body_text()))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

/// `GET /api/health` — liveness check.
///
/// Returns `200 OK` with the object count when the catalog is readable,
/// `503 Service Unavailable` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let objects = match state.vault.count().await {
        Ok(n) => Some(n),
        Err(e) => {
            warn!(error = %e, "health check could not read catalog");
            None
        }
    };
    let (status_code, status_str) = match objects {
        Some(_) => (StatusCode::OK, "ok"),
        None => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
    };
    let body = HealthResponse {
        status: status_str.into(),
        timestamp: Utc::now(),
        objects,
    };
    (status_code, Json(body)).into_response()
}

/// `POST /api/upload` — encrypt and store the multipart `file` field.
///
/// The field is streamed straight into the vault's staging buffer; other
/// fields are ignored.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<FileDescriptor>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or(DEFAULT_NAME).to_owned();
        let mime = field
            .content_type()
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_owned();

        let reader = StreamReader::new(
            field.map_err(|e| io::Error::new(io::ErrorKind::Other, e)),
        );
        tokio::pin!(reader);

        let descriptor = state.vault.upload(&name, &mime, reader).await?;
        return Ok(Json(descriptor.to_view()));
    }
    Err(ApiError(ServiceError::BadRequest("no file uploaded".into())))
}

/// `GET /api/files` — all descriptors, newest first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<FileDescriptor>>, ApiError> {
    let descriptors = state.vault.list().await?;
    Ok(Json(descriptors.iter().map(|d| d.to_view()).collect()))
}

/// `GET /api/download/:id` — decrypted file as an attachment.
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = ObjectId::parse(&id)?;
    let mut download = state.vault.download(&id).await?;

    // The body owns the plaintext from here on; it is released when the
    // transfer completes or the client disconnects.
    let plaintext = Bytes::from(std::mem::take(&mut *download.plaintext));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            attachment_disposition(&download.descriptor.original_name),
        )
        .header(header::CACHE_CONTROL, "no-store")
        .header("x-content-type-options", "nosniff")
        .body(Body::from(plaintext))
        .map_err(|e| {
            warn!(error = %e, "failed to build download response");
            ApiError(ServiceError::Internal("download failed".into()))
        })?;
    Ok(response)
}

/// `DELETE /api/files/:id` — remove ciphertext and descriptor.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = ObjectId::parse(&id)?;
    state.vault.delete(&id).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "File deleted successfully".into(),
    }))
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

/// `Content-Disposition` value for an untrusted file name.
///
/// Anything outside printable ASCII, plus quotes and backslashes, becomes `_`.
fn attachment_disposition(name: &str) -> HeaderValue {
    let safe: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = if safe.trim().is_empty() {
        "download".to_owned()
    } else {
        safe
    };
    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_keeps_plain_names() {
        assert_eq!(
            attachment_disposition("report 2024.pdf"),
            "attachment; filename=\"report 2024.pdf\""
        );
    }

    #[test]
    fn disposition_sanitises_hostile_names() {
        let v = attachment_disposition("a\"b\\c\r\nSet-Cookie: x.txt");
        let s = v.to_str().unwrap();
        assert_eq!(s, "attachment; filename=\"a_b_c__Set-Cookie: x.txt\"");
    }

    #[test]
    fn disposition_replaces_non_ascii() {
        assert_eq!(
            attachment_disposition("résumé.txt"),
            "attachment; filename=\"r_sum_.txt\""
        );
        assert_eq!(attachment_disposition(""), "attachment; filename=\"download\"");
    }

    #[test]
    fn vault_errors_map_to_statuses() {
        let id = ObjectId::parse("abc").unwrap();
        let resp = ApiError::from(VaultError::NotFound(id)).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = ApiError::from(VaultError::Integrity).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let resp = ApiError::from(VaultError::TooLarge { limit: 1 }).into_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
