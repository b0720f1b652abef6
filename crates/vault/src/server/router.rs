//! Axum router construction.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{set_header::SetResponseHeaderLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Router settings derived from configuration.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Plaintext ceiling; the request body limit adds multipart overhead.
    pub max_file_size: u64,
    /// Browser origin admitted by CORS.
    pub client_url: String,
}

/// Build the application [`Router`] with all routes and middleware attached.
///
/// Every response, including errors and the 404 fallback, carries the
/// [`middleware::security_headers`].
pub fn build(state: AppState, opts: &RouterOptions) -> Router {
    let body_limit = usize::try_from(opts.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(middleware::MULTIPART_OVERHEAD);

    let mut router = Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/files", get(handlers::list))
        .route("/api/files/:id", delete(handlers::delete))
        .route("/api/download/:id", get(handlers::download))
        .fallback(handlers::not_found);
    for (name, value) in middleware::security_headers() {
        router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(middleware::cors(&opts.client_url))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request, http::StatusCode};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use common::protocol::{DeleteResponse, FileDescriptor, HealthResponse};
    use tower::ServiceExt;

    use super::*;
    use crate::blob::FsBlobStore;
    use crate::crypto::generate_key;
    use crate::lifecycle::Vault;

    const LIMIT: u64 = 1024;

    async fn app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path(), generate_key(), LIMIT).await.unwrap();
        let opts = RouterOptions {
            max_file_size: LIMIT,
            client_url: "http://localhost:3000".into(),
        };
        (dir, build(AppState::new(vault), &opts))
    }

    fn file_form(name: &str, bytes: &'static [u8]) -> MultipartForm {
        MultipartForm::new().add_part(
            "file",
            Part::bytes(bytes).file_name(name).mime_type("text/plain"),
        )
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (_dir, app) = app().await;
        let req = Request::builder()
            .uri("/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn security_headers_on_every_response() {
        let (_dir, app) = app().await;
        for uri in ["/api/health", "/api/files", "/unknown", "/api/download/nope"] {
            let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let resp = app.clone().oneshot(req).await.unwrap();
            let headers = resp.headers();
            assert_eq!(
                headers["content-security-policy"],
                middleware::CONTENT_SECURITY_POLICY,
                "{uri}"
            );
            assert_eq!(headers["x-content-type-options"], "nosniff", "{uri}");
            assert_eq!(headers["x-frame-options"], "SAMEORIGIN", "{uri}");
            assert_eq!(headers["referrer-policy"], "no-referrer", "{uri}");
        }
    }

    #[tokio::test]
    async fn health_reports_object_count() {
        let (_dir, app) = app().await;
        let server = TestServer::new(app).unwrap();
        let resp = server.get("/api/health").await;
        resp.assert_status_ok();
        let body: HealthResponse = resp.json();
        assert_eq!(body.status, "ok");
        assert_eq!(body.objects, Some(0));
    }

    #[tokio::test]
    async fn upload_list_download_delete() {
        let (_dir, app) = app().await;
        let server = TestServer::new(app).unwrap();

        let resp = server
            .post("/api/upload")
            .multipart(file_form("hello.txt", b"hello world"))
            .await;
        resp.assert_status_ok();
        let uploaded: FileDescriptor = resp.json();
        assert_eq!(uploaded.original_name, "hello.txt");
        assert_eq!(uploaded.size, 11);
        assert_eq!(uploaded.mime_type, "text/plain");

        let listed: Vec<FileDescriptor> = server.get("/api/files").await.json();
        assert_eq!(listed, vec![uploaded.clone()]);

        let resp = server.get(&format!("/api/download/{}", uploaded.id)).await;
        resp.assert_status_ok();
        assert_eq!(resp.as_bytes().as_ref(), b"hello world");
        assert_eq!(
            resp.header("content-disposition"),
            "attachment; filename=\"hello.txt\""
        );

        let resp = server.delete(&format!("/api/files/{}", uploaded.id)).await;
        resp.assert_status_ok();
        let ack: DeleteResponse = resp.json();
        assert!(ack.success);

        server
            .get(&format!("/api/download/{}", uploaded.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/api/files/{}", uploaded.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_without_file_field_is_bad_request() {
        let (_dir, app) = app().await;
        let server = TestServer::new(app).unwrap();
        let form = MultipartForm::new().add_text("note", "no file here");
        server
            .post("/api/upload")
            .multipart(form)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversize_upload_is_rejected() {
        let (_dir, app) = app().await;
        let server = TestServer::new(app).unwrap();
        static BIG: [u8; 2048] = [b'x'; 2048];
        server
            .post("/api/upload")
            .multipart(file_form("big.bin", &BIG))
            .await
            .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        let listed: Vec<FileDescriptor> = server.get("/api/files").await.json();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn malformed_ids_are_not_found() {
        let (_dir, app) = app().await;
        let req = Request::builder()
            .uri("/api/download/..%2F..%2Fetc%2Fpasswd")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = Request::builder()
            .method("DELETE")
            .uri("/api/files/does-not-exist")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn degraded_health_when_catalog_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = FsBlobStore::open(dir.path()).await.unwrap();
        let mut catalog = crate::catalog::MockCatalog::new();
        catalog.expect_list().returning(|| {
            Err(crate::VaultError::io("scan")(std::io::Error::new(
                std::io::ErrorKind::Other,
                "gone",
            )))
        });
        let vault = Vault::new(generate_key(), Arc::new(catalog), Arc::new(blobs), LIMIT);
        let opts = RouterOptions {
            max_file_size: LIMIT,
            client_url: "http://localhost:3000".into(),
        };
        let app = build(AppState::new(vault), &opts);
        let req = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
