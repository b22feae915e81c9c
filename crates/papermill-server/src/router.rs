// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Route table and middleware stack.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{compress, images, office, pages, password, raster};
use crate::state::AppState;

/// Multi-file operations (merge, image batches) carry several uploads per
/// request, so the whole-body cap is a multiple of the per-file cap.
const BODY_LIMIT_FILES: usize = 8;

/// Build the application router.
///
/// One endpoint per operation under `/api/tools`, CORS open for browser
/// callers, and per-request tracing.
pub fn build(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes.saturating_mul(BODY_LIMIT_FILES);

    Router::new()
        .route("/api/tools/word-to-pdf", post(office::word_to_pdf))
        .route("/api/tools/excel-to-pdf", post(office::excel_to_pdf))
        .route(
            "/api/tools/powerpoint-to-pdf",
            post(office::powerpoint_to_pdf),
        )
        .route("/api/tools/pdf-to-word", post(office::pdf_to_word))
        .route("/api/tools/pdf-to-image", post(raster::pdf_to_image))
        .route("/api/tools/image-to-pdf", post(images::image_to_pdf))
        .route("/api/tools/pdf-split", post(pages::split_pdf))
        .route("/api/tools/pdf-merge", post(pages::merge_pdfs))
        .route("/api/tools/pdf-compress", post(compress::compress_pdf))
        .route("/api/tools/password-protect", post(password::protect))
        .route(
            "/api/tools/password-protect/check",
            post(password::protect_check),
        )
        .route("/api/tools/unlock-pdf/unlock", post(password::unlock))
        .route("/api/tools/unlock-pdf/check", post(password::unlock_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use papermill_core::config::ServiceConfig;
    use papermill_document::PdfPages;

    const BOUNDARY: &str = "papermill-router-test";

    /// Router over a throwaway workspace root.  The returned tempdir must
    /// outlive the router.
    fn test_router() -> (tempfile::TempDir, Router) {
        let root = tempfile::tempdir().expect("tempdir");
        let config = ServiceConfig {
            workspace_root: root.path().to_path_buf(),
            ..ServiceConfig::default()
        };
        (root, build(AppState::new(config)))
    }

    fn blank_pdf(pages: usize) -> Vec<u8> {
        use printpdf::{Mm, PdfDocument, PdfPage, PdfSaveOptions};

        let mut doc = PdfDocument::new("fixture");
        let page_list: Vec<PdfPage> = (0..pages)
            .map(|_| PdfPage::new(Mm(210.0), Mm(297.0), Vec::new()))
            .collect();
        doc.with_pages(page_list);

        let mut warnings = Vec::new();
        doc.save(&PdfSaveOptions::default(), &mut warnings)
    }

    fn test_png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(32, 32, image::Rgb([10, 120, 240]));
        let mut buffer = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .expect("encode png");
        buffer.into_inner()
    }

    fn multipart_body(files: &[(&str, &str, &[u8])], params: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (field, filename, content) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                     filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        for (name, value) in params {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn post_multipart(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("build request")
    }

    async fn response_bytes(response: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("drain body")
            .to_vec()
    }

    #[tokio::test]
    async fn merge_route_returns_combined_pdf() {
        let (_root, router) = test_router();
        let body = multipart_body(
            &[
                ("files", "a.pdf", &blank_pdf(2)),
                ("files", "b.pdf", &blank_pdf(3)),
            ],
            &[],
        );

        let response = router
            .oneshot(post_multipart("/api/tools/pdf-merge", body))
            .await
            .expect("roundtrip");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .unwrap(),
            "attachment; filename=\"merged.pdf\""
        );

        let merged = response_bytes(response).await;
        assert_eq!(
            PdfPages::from_bytes(&merged).expect("parse").page_count(),
            5
        );
    }

    #[tokio::test]
    async fn merge_with_one_file_is_rejected() {
        let (_root, router) = test_router();
        let body = multipart_body(&[("files", "a.pdf", &blank_pdf(2))], &[]);

        let response = router
            .oneshot(post_multipart("/api/tools/pdf-merge", body))
            .await
            .expect("roundtrip");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload: serde_json::Value =
            serde_json::from_slice(&response_bytes(response).await).expect("json error body");
        assert!(payload["error"].as_str().unwrap().contains("at least 2"));
    }

    #[tokio::test]
    async fn split_route_extracts_pages() {
        let (_root, router) = test_router();
        let body = multipart_body(
            &[("file", "five.pdf", &blank_pdf(5))],
            &[("ranges", "2-4")],
        );

        let response = router
            .oneshot(post_multipart("/api/tools/pdf-split", body))
            .await
            .expect("roundtrip");

        assert_eq!(response.status(), StatusCode::OK);
        let split = response_bytes(response).await;
        assert_eq!(PdfPages::from_bytes(&split).expect("parse").page_count(), 3);
    }

    #[tokio::test]
    async fn split_route_rejects_inverted_range_before_parsing() {
        let (_root, router) = test_router();
        let body = multipart_body(
            &[("file", "five.pdf", &blank_pdf(5))],
            &[("ranges", "3-2")],
        );

        let response = router
            .oneshot(post_multipart("/api/tools/pdf-split", body))
            .await
            .expect("roundtrip");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn split_route_reports_out_of_range() {
        let (_root, router) = test_router();
        let body = multipart_body(
            &[("file", "five.pdf", &blank_pdf(5))],
            &[("ranges", "1-9")],
        );

        let response = router
            .oneshot(post_multipart("/api/tools/pdf-split", body))
            .await
            .expect("roundtrip");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload: serde_json::Value =
            serde_json::from_slice(&response_bytes(response).await).expect("json error body");
        assert!(payload["error"].as_str().unwrap().contains("5 pages"));
    }

    #[tokio::test]
    async fn image_route_composes_pdf() {
        let (_root, router) = test_router();
        let body = multipart_body(&[("images", "photo.png", &test_png())], &[]);

        let response = router
            .oneshot(post_multipart("/api/tools/image-to-pdf", body))
            .await
            .expect("roundtrip");

        assert_eq!(response.status(), StatusCode::OK);
        let pdf = response_bytes(response).await;
        assert_eq!(PdfPages::from_bytes(&pdf).expect("parse").page_count(), 1);
    }

    #[tokio::test]
    async fn compress_route_rejects_unknown_mode() {
        let (_root, router) = test_router();
        let body = multipart_body(
            &[("file", "a.pdf", &blank_pdf(1))],
            &[("mode", "maximum")],
        );

        let response = router
            .oneshot(post_multipart("/api/tools/pdf-compress", body))
            .await
            .expect("roundtrip");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let (_root, router) = test_router();
        let body = multipart_body(&[], &[("ranges", "1-2")]);

        let response = router
            .oneshot(post_multipart("/api/tools/pdf-split", body))
            .await
            .expect("roundtrip");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wrong_extension_is_rejected() {
        let (_root, router) = test_router();
        let body = multipart_body(&[("file", "notes.txt", b"hello")], &[]);

        let response = router
            .oneshot(post_multipart("/api/tools/word-to-pdf", body))
            .await
            .expect("roundtrip");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn workspace_root_is_clean_after_in_memory_requests() {
        let (root, router) = test_router();

        let body = multipart_body(
            &[
                ("files", "a.pdf", &blank_pdf(1)),
                ("files", "b.pdf", &blank_pdf(1)),
            ],
            &[],
        );
        let response = router
            .oneshot(post_multipart("/api/tools/pdf-merge", body))
            .await
            .expect("roundtrip");
        let _ = response_bytes(response).await;

        let leftovers: Vec<_> = std::fs::read_dir(root.path())
            .expect("read root")
            .collect();
        assert!(leftovers.is_empty(), "leaked workspaces: {leftovers:?}");
    }
}
