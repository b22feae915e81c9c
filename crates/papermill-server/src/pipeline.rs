// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operation pipelines — one function per supported transformation.
//
// Engine-backed operations stage their input into a fresh workspace, run
// the external engine, and hand the produced file (workspace included) to
// the result streamer.  Page-level and image operations work on the
// uploaded bytes in memory and never touch the disk; their CPU-bound parts
// run on the blocking pool so one large document does not stall the
// reactor.  Either way the workspace, where one exists, is gone once the
// response has been sent or the request has failed.

use std::path::Path;

use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use papermill_core::error::{PapermillError, Result};
use papermill_core::types::{Artifact, CompressionTier, DocumentKind, PageRange};
use papermill_document::archive::zip_bundle;
use papermill_document::{PdfComposer, PdfPages};
use papermill_engine::catalog::{OfficeTarget, QPDF};

use crate::state::AppState;
use crate::stream::ArtifactResponse;
use crate::upload::Upload;

/// Content type for the rasterisation archive.
const ZIP_MIME: &str = "application/zip";

/// Subdirectory for rasterised pages, kept apart from the staged input so
/// the page-prefix scan can never pick up an upload named `page*.pdf`.
const RASTER_OUTDIR: &str = "rendered";

// ---------------------------------------------------------------------------
// Engine-backed pipelines
// ---------------------------------------------------------------------------

/// Office ↔ fixed-layout conversion via LibreOffice.
#[instrument(skip(state, upload), fields(file = %upload.filename, target = ?target))]
pub async fn office_convert(
    state: &AppState,
    upload: &Upload,
    target: OfficeTarget,
) -> Result<ArtifactResponse> {
    let workspace = state.workspaces.acquire().await?;
    let input = workspace.stage(&upload.filename, &upload.bytes).await?;

    let invocation = state.engines.office_convert(&input, workspace.dir(), target);
    let mut outputs = state.adapter.invoke(&invocation).await?;
    let output = outputs
        .pop()
        .ok_or_else(|| PapermillError::EngineOutputMissing {
            engine: invocation.engine,
            expected: format!("{}.{}", upload_stem(upload), target.extension()),
        })?;

    let filename = format!("{}.{}", upload_stem(upload), target.extension());
    let content_type = match target {
        OfficeTarget::Pdf => DocumentKind::Pdf.mime_type(),
        OfficeTarget::Docx => DocumentKind::Word.mime_type(),
    };

    info!(
        sha256 = %upload.sha256,
        output = %output.display(),
        "office conversion complete"
    );

    let artifact = Artifact::from_file(output, content_type, filename);
    ArtifactResponse::new(artifact, Some(workspace)).await
}

/// PDF → archive of per-page JPEGs via pdftoppm.
#[instrument(skip(state, upload), fields(file = %upload.filename))]
pub async fn rasterize(state: &AppState, upload: &Upload) -> Result<ArtifactResponse> {
    let workspace = state.workspaces.acquire().await?;
    let input = workspace.stage(&upload.filename, &upload.bytes).await?;

    let outdir = workspace.path(RASTER_OUTDIR);
    tokio::fs::create_dir(&outdir).await?;

    let invocation = state.engines.rasterize(&input, &outdir);
    let pages = state.adapter.invoke(&invocation).await?;

    let mut entries = Vec::with_capacity(pages.len());
    for (index, page) in pages.iter().enumerate() {
        let bytes = tokio::fs::read(page).await?;
        entries.push((format!("page_{}.jpg", index + 1), bytes));
    }

    info!(pages = entries.len(), sha256 = %upload.sha256, "rasterisation complete");

    let archive = run_blocking(move || zip_bundle(&entries)).await?;
    let artifact = Artifact::from_bytes(archive, ZIP_MIME, "images.zip".into());
    ArtifactResponse::new(artifact, Some(workspace)).await
}

/// PDF recompression via Ghostscript, with before/after size metadata.
#[instrument(skip(state, upload), fields(file = %upload.filename, tier = ?tier))]
pub async fn compress(
    state: &AppState,
    upload: &Upload,
    tier: CompressionTier,
) -> Result<ArtifactResponse> {
    let workspace = state.workspaces.acquire().await?;
    let input = workspace.stage(&upload.filename, &upload.bytes).await?;

    let output_name = format!("compressed_{}", staged_name(&input));
    let output = workspace.path(&output_name);

    let invocation = state.engines.compress(&input, &output, tier);
    state.adapter.invoke(&invocation).await?;

    let original_bytes = upload.bytes.len() as u64;
    let compressed_bytes = tokio::fs::metadata(&output).await?.len();

    info!(
        sha256 = %upload.sha256,
        original_bytes,
        compressed_bytes,
        "compression complete"
    );

    let artifact = Artifact::from_file(output, DocumentKind::Pdf.mime_type(), output_name);
    Ok(ArtifactResponse::new(artifact, Some(workspace))
        .await?
        .with_header("x-original-size-mb", format_mb(original_bytes))
        .with_header("x-compressed-size-mb", format_mb(compressed_bytes)))
}

/// Encrypt an unprotected PDF with the supplied password (owner = user).
#[instrument(skip(state, upload, password), fields(file = %upload.filename))]
pub async fn protect(
    state: &AppState,
    upload: &Upload,
    password: &str,
) -> Result<ArtifactResponse> {
    let workspace = state.workspaces.acquire().await?;
    let input = workspace.stage(&upload.filename, &upload.bytes).await?;

    if probe_encryption(state, &input).await? {
        return Err(PapermillError::AlreadyProtected(upload.filename.clone()));
    }

    let output_name = format!("protected_{}", staged_name(&input));
    let output = workspace.path(&output_name);

    let invocation = state.engines.encrypt(&input, &output, password);
    state.adapter.invoke(&invocation).await?;

    info!(sha256 = %upload.sha256, "document protected");

    let artifact = Artifact::from_file(output, DocumentKind::Pdf.mime_type(), output_name);
    ArtifactResponse::new(artifact, Some(workspace)).await
}

/// Report whether a PDF is currently password-protected (protect tool).
#[instrument(skip(state, upload), fields(file = %upload.filename))]
pub async fn protect_check(state: &AppState, upload: &Upload) -> Result<Value> {
    let workspace = state.workspaces.acquire().await?;
    let input = workspace.stage(&upload.filename, &upload.bytes).await?;

    let locked = probe_encryption(state, &input).await?;
    Ok(if locked {
        json!({
            "locked": true,
            "message": "This PDF is already password-protected.",
        })
    } else {
        json!({
            "locked": false,
            "message": "This PDF is unlocked and can be protected.",
        })
    })
}

/// Decrypt (if needed) and re-save a PDF without protection.
#[instrument(skip(state, upload, password), fields(file = %upload.filename))]
pub async fn unlock(
    state: &AppState,
    upload: &Upload,
    password: Option<&str>,
) -> Result<ArtifactResponse> {
    let workspace = state.workspaces.acquire().await?;
    let input = workspace.stage(&upload.filename, &upload.bytes).await?;

    let locked = probe_encryption(state, &input).await?;
    if locked && password.is_none() {
        return Err(PapermillError::AuthFailed(
            "this document is encrypted; a password is required".into(),
        ));
    }

    let output_name = format!("unlocked_{}", staged_name(&input));
    let output = workspace.path(&output_name);

    let invocation = state
        .engines
        .decrypt(&input, &output, if locked { password } else { None });
    let outcome = state.adapter.execute(&invocation).await?;

    if !outcome.success() {
        warn!(code = ?outcome.code, stderr = %outcome.stderr, "decryption failed");
        return Err(classify_unlock_failure(locked, outcome.code));
    }
    invocation.expected.verify(invocation.engine)?;

    info!(sha256 = %upload.sha256, was_locked = locked, "document unlocked");

    let artifact = Artifact::from_file(output, DocumentKind::Pdf.mime_type(), output_name);
    ArtifactResponse::new(artifact, Some(workspace)).await
}

/// Report whether a PDF is currently password-protected (unlock tool).
#[instrument(skip(state, upload), fields(file = %upload.filename))]
pub async fn unlock_check(state: &AppState, upload: &Upload) -> Result<Value> {
    let workspace = state.workspaces.acquire().await?;
    let input = workspace.stage(&upload.filename, &upload.bytes).await?;

    let locked = probe_encryption(state, &input).await?;
    Ok(if locked {
        json!({
            "locked": true,
            "type": "user",
            "message": "This PDF is locked. Please enter the password to unlock.",
        })
    } else {
        json!({
            "locked": false,
            "message": "This PDF is already unlocked.",
        })
    })
}

// ---------------------------------------------------------------------------
// In-memory pipelines
// ---------------------------------------------------------------------------

/// Extract a validated page range into a standalone PDF.
#[instrument(skip(upload), fields(file = %upload.filename, start = range.start, end = range.end))]
pub async fn split(upload: &Upload, range: PageRange) -> Result<ArtifactResponse> {
    let bytes = upload.bytes.clone();
    let extracted =
        run_blocking(move || PdfPages::from_bytes(&bytes)?.extract_range(range)).await?;

    info!(pages = range.len(), sha256 = %upload.sha256, "split complete");

    let filename = format!("split_{}-{}.pdf", range.start, range.end);
    let artifact = Artifact::from_bytes(extracted, DocumentKind::Pdf.mime_type(), filename);
    ArtifactResponse::new(artifact, None).await
}

/// Append the uploaded PDFs into one document, preserving upload order.
#[instrument(skip(uploads), fields(count = uploads.len()))]
pub async fn merge(uploads: &[&Upload]) -> Result<ArtifactResponse> {
    if uploads.len() < 2 {
        return Err(PapermillError::InvalidInput(
            "merging requires at least two documents".into(),
        ));
    }

    let parts: Vec<Vec<u8>> = uploads.iter().map(|u| u.bytes.clone()).collect();
    let merged = run_blocking(move || {
        let first = PdfPages::from_bytes(&parts[0])?;
        let rest: Vec<&[u8]> = parts[1..].iter().map(Vec::as_slice).collect();
        first.merge(&rest)
    })
    .await?;

    info!(documents = uploads.len(), "merge complete");

    let artifact = Artifact::from_bytes(
        merged,
        DocumentKind::Pdf.mime_type(),
        "merged.pdf".into(),
    );
    ArtifactResponse::new(artifact, None).await
}

/// Compose uploaded images into one PDF, one page per image in upload order.
#[instrument(skip(uploads), fields(count = uploads.len()))]
pub async fn compose_images(uploads: &[&Upload]) -> Result<ArtifactResponse> {
    let images: Vec<Vec<u8>> = uploads.iter().map(|u| u.bytes.clone()).collect();
    let composed = run_blocking(move || PdfComposer::default().compose(&images)).await?;

    info!(images = uploads.len(), "image composition complete");

    let artifact = Artifact::from_bytes(
        composed,
        DocumentKind::Pdf.mime_type(),
        "images.pdf".into(),
    );
    ArtifactResponse::new(artifact, None).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Ask qpdf whether the document is encrypted.
///
/// qpdf exits 0 for an encrypted file and 2 for a plain one; anything else
/// means the probe itself failed.
async fn probe_encryption(state: &AppState, input: &Path) -> Result<bool> {
    let invocation = state.engines.probe_encryption(input);
    let outcome = state.adapter.execute(&invocation).await?;

    match outcome.code {
        Some(0) => Ok(true),
        Some(2) => Ok(false),
        code => {
            warn!(?code, stderr = %outcome.stderr, "encryption probe failed");
            Err(PapermillError::EngineFailure {
                engine: QPDF,
                detail: match code {
                    Some(code) => format!("probe exit code {code}"),
                    None => "probe terminated by signal".into(),
                },
            })
        }
    }
}

/// Map a failed decryption to the taxonomy.
///
/// On an encrypted input qpdf's failure means the supplied password was
/// wrong; on a plain input a failure is the engine's own problem.
fn classify_unlock_failure(locked: bool, code: Option<i32>) -> PapermillError {
    if locked {
        PapermillError::AuthFailed("incorrect password or unable to unlock PDF".into())
    } else {
        PapermillError::EngineFailure {
            engine: QPDF,
            detail: match code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".into(),
            },
        }
    }
}

/// Run a CPU-bound closure on the blocking pool.
async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| PapermillError::Io(std::io::Error::other(err)))?
}

/// Two-decimal megabyte figure for the size metadata headers.
fn format_mb(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / (1024.0 * 1024.0))
}

/// Filename stem of the upload, for naming derived artifacts.
fn upload_stem(upload: &Upload) -> String {
    Path::new(&upload.filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "converted".into())
}

/// Final component of a staged path (already sanitized by the workspace).
fn staged_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(filename: &str, bytes: Vec<u8>) -> Upload {
        let sha256 = hex::encode(<sha2::Sha256 as sha2::Digest>::digest(&bytes));
        Upload {
            field: "file".into(),
            filename: filename.into(),
            bytes,
            sha256,
        }
    }

    /// Build a blank test PDF with the given number of pages.
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

    async fn body_bytes(response: ArtifactResponse) -> Vec<u8> {
        use axum::response::IntoResponse;
        let response = response.into_response();
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("drain body")
            .to_vec()
    }

    #[tokio::test]
    async fn split_extracts_requested_pages() {
        let source = upload("five.pdf", blank_pdf(5));
        let range = PageRange::parse("2-2").expect("range");

        let response = split(&source, range).await.expect("split");
        let bytes = body_bytes(response).await;

        let result = PdfPages::from_bytes(&bytes).expect("parse output");
        assert_eq!(result.page_count(), 1);
    }

    #[tokio::test]
    async fn split_past_the_last_page_is_out_of_range() {
        let source = upload("five.pdf", blank_pdf(5));
        let range = PageRange::parse("1-9").expect("range parses");

        let err = split(&source, range).await.expect_err("must fail");
        assert!(matches!(err, PapermillError::OutOfRange(_)));
    }

    #[tokio::test]
    async fn merge_concatenates_in_upload_order() {
        let a = upload("a.pdf", blank_pdf(2));
        let b = upload("b.pdf", blank_pdf(3));

        let response = merge(&[&a, &b]).await.expect("merge");
        let bytes = body_bytes(response).await;

        let result = PdfPages::from_bytes(&bytes).expect("parse output");
        assert_eq!(result.page_count(), 5);
    }

    #[tokio::test]
    async fn merge_requires_two_documents() {
        let a = upload("a.pdf", blank_pdf(2));
        let err = merge(&[&a]).await.expect_err("must fail");
        assert!(matches!(err, PapermillError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn compose_rejects_undecodable_image() {
        let bad = upload("x.png", b"not an image".to_vec());
        let err = compose_images(&[&bad]).await.expect_err("must fail");
        assert!(matches!(err, PapermillError::Image(_)));
    }

    #[test]
    fn unlock_failure_classification() {
        assert!(matches!(
            classify_unlock_failure(true, Some(2)),
            PapermillError::AuthFailed(_)
        ));
        assert!(matches!(
            classify_unlock_failure(false, Some(2)),
            PapermillError::EngineFailure { .. }
        ));
    }

    #[test]
    fn size_headers_use_two_decimal_megabytes() {
        assert_eq!(format_mb(1024 * 1024), "1.00");
        assert_eq!(format_mb(1536 * 1024), "1.50");
        assert_eq!(format_mb(0), "0.00");
    }

    #[test]
    fn artifact_names_derive_from_upload() {
        let source = upload("Quarterly Report.docx", vec![1]);
        assert_eq!(upload_stem(&source), "Quarterly Report");
        assert_eq!(staged_name(Path::new("/ws/abc/report.pdf")), "report.pdf");
    }
}
