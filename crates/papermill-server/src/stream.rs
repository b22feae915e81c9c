// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result streaming.
//
// Sends an artifact back to the caller with its content type and a download
// filename.  In-memory artifacts respond directly.  File-backed artifacts
// still live inside the request's workspace, so the workspace is moved into
// the body stream — it is released when the stream is dropped, which happens
// only after the bytes went out or the connection broke, never before.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::Stream;
use tokio_util::io::ReaderStream;

use papermill_core::error::Result;
use papermill_core::types::{Artifact, ArtifactPayload};
use papermill_engine::Workspace;

/// A response-ready artifact.
pub struct ArtifactResponse {
    body: Body,
    content_type: &'static str,
    filename: String,
    extra_headers: Vec<(&'static str, String)>,
}

impl ArtifactResponse {
    /// Wrap an artifact, taking ownership of the workspace that backs it.
    ///
    /// `workspace` must be `Some` for file-backed payloads; in-memory
    /// payloads no longer need theirs and release it here.
    pub async fn new(artifact: Artifact, workspace: Option<Workspace>) -> Result<Self> {
        let body = match artifact.payload {
            ArtifactPayload::Bytes(bytes) => {
                drop(workspace);
                Body::from(bytes)
            }
            ArtifactPayload::File(path) => {
                let file = tokio::fs::File::open(&path).await?;
                Body::from_stream(GuardedStream {
                    inner: ReaderStream::new(file),
                    _workspace: workspace,
                })
            }
        };

        Ok(Self {
            body,
            content_type: artifact.content_type,
            filename: artifact.filename,
            extra_headers: Vec::new(),
        })
    }

    /// Attach an additional response header (size metadata on compress).
    pub fn with_header(mut self, name: &'static str, value: String) -> Self {
        self.extra_headers.push((name, value));
        self
    }
}

impl IntoResponse for ArtifactResponse {
    fn into_response(self) -> Response {
        let disposition = format!(
            "attachment; filename=\"{}\"",
            sanitize_header_filename(&self.filename)
        );

        let mut response = Response::builder()
            .header(header::CONTENT_TYPE, self.content_type)
            .header(header::CONTENT_DISPOSITION, disposition);

        for (name, value) in self.extra_headers {
            response = response.header(name, value);
        }

        response
            .body(self.body)
            .expect("statically valid response")
    }
}

/// A file stream that keeps the backing workspace alive until it is dropped.
struct GuardedStream {
    inner: ReaderStream<tokio::fs::File>,
    _workspace: Option<Workspace>,
}

impl Stream for GuardedStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Keep download filenames header-safe: drop quotes and control characters.
fn sanitize_header_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect()
}
