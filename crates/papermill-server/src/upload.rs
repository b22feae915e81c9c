// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multipart form ingestion.
//
// Reads the whole multipart stream once, splitting it into uploaded files
// (fields that carry a filename) and plain text parameters.  File data is
// accumulated chunk by chunk against the configured per-file cap so an
// oversized upload is rejected before it exhausts memory.

use std::collections::HashMap;

use axum::extract::Multipart;
use sha2::{Digest, Sha256};
use tracing::debug;

use papermill_core::error::{PapermillError, Result};

/// One uploaded file from a multipart request.
#[derive(Debug)]
pub struct Upload {
    /// Form field it arrived under (`files[]` is normalised to `files`).
    pub field: String,
    /// Caller-declared filename.
    pub filename: String,
    pub bytes: Vec<u8>,
    /// SHA-256 of the content, for the audit log.
    pub sha256: String,
}

impl Upload {
    /// Lowercased filename extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

/// Parsed multipart request: uploads in arrival order plus text parameters.
#[derive(Debug, Default)]
pub struct FormData {
    uploads: Vec<Upload>,
    params: HashMap<String, String>,
}

impl FormData {
    /// Drain a multipart stream.
    ///
    /// `max_file_bytes` bounds each individual file.  A malformed stream or
    /// an oversized file is `InvalidInput`.
    pub async fn read(mut multipart: Multipart, max_file_bytes: usize) -> Result<Self> {
        let mut form = Self::default();

        while let Some(mut field) = multipart.next_field().await.map_err(|err| {
            PapermillError::InvalidInput(format!("malformed multipart request: {err}"))
        })? {
            let name = normalise_field_name(field.name().unwrap_or_default());

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let mut bytes = Vec::new();
                    while let Some(chunk) = field.chunk().await.map_err(|err| {
                        PapermillError::InvalidInput(format!(
                            "failed reading upload {filename:?}: {err}"
                        ))
                    })? {
                        if bytes.len() + chunk.len() > max_file_bytes {
                            return Err(PapermillError::InvalidInput(format!(
                                "file {filename:?} exceeds the {} MB upload limit",
                                max_file_bytes / (1024 * 1024)
                            )));
                        }
                        bytes.extend_from_slice(&chunk);
                    }

                    let sha256 = hex::encode(Sha256::digest(&bytes));
                    debug!(
                        field = %name,
                        filename = %filename,
                        bytes = bytes.len(),
                        sha256 = %sha256,
                        "upload received"
                    );

                    form.uploads.push(Upload {
                        field: name,
                        filename,
                        bytes,
                        sha256,
                    });
                }
                None => {
                    let value = field.text().await.map_err(|err| {
                        PapermillError::InvalidInput(format!(
                            "failed reading field {name:?}: {err}"
                        ))
                    })?;
                    form.params.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// First upload under the given field name.
    pub fn upload(&self, field: &str) -> Option<&Upload> {
        self.uploads.iter().find(|u| u.field == field)
    }

    /// All uploads under the given field name, in arrival order.
    pub fn uploads(&self, field: &str) -> Vec<&Upload> {
        self.uploads.iter().filter(|u| u.field == field).collect()
    }

    /// A text parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Treat `files[]` and `files` as the same field.
fn normalise_field_name(name: &str) -> String {
    name.strip_suffix("[]").unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequest;
    use axum::http::Request;

    const BOUNDARY: &str = "papermill-test-boundary";

    /// Assemble a multipart body from (field, filename, content) file parts
    /// and (name, value) text parts.
    fn multipart_body(
        files: &[(&str, &str, &[u8])],
        params: &[(&str, &str)],
    ) -> Vec<u8> {
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

    async fn parse(body: Vec<u8>, max_file_bytes: usize) -> Result<FormData> {
        let request = Request::builder()
            .method("POST")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(axum::body::Body::from(body))
            .expect("build request");

        let multipart = Multipart::from_request(request, &())
            .await
            .expect("extract multipart");
        FormData::read(multipart, max_file_bytes).await
    }

    #[tokio::test]
    async fn splits_files_and_params() {
        let body = multipart_body(
            &[("file", "report.pdf", b"%PDF-1.4 data")],
            &[("mode", "extreme")],
        );

        let form = parse(body, 1024).await.expect("parse");

        let upload = form.upload("file").expect("file present");
        assert_eq!(upload.filename, "report.pdf");
        assert_eq!(upload.bytes, b"%PDF-1.4 data");
        assert_eq!(upload.extension().as_deref(), Some("pdf"));
        assert_eq!(form.param("mode"), Some("extreme"));
        assert!(form.upload("other").is_none());
    }

    #[tokio::test]
    async fn preserves_upload_order_and_bracket_suffix() {
        let body = multipart_body(
            &[
                ("files[]", "a.pdf", b"aaa"),
                ("files[]", "b.pdf", b"bbb"),
                ("files[]", "c.pdf", b"ccc"),
            ],
            &[],
        );

        let form = parse(body, 1024).await.expect("parse");
        let uploads = form.uploads("files");

        let names: Vec<_> = uploads.iter().map(|u| u.filename.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let big = vec![0u8; 64];
        let body = multipart_body(&[("file", "big.pdf", &big)], &[]);

        let err = parse(body, 16).await.expect_err("must reject");
        assert!(matches!(err, PapermillError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn hashes_uploaded_content() {
        let body = multipart_body(&[("file", "a.pdf", b"hello")], &[]);
        let form = parse(body, 1024).await.expect("parse");

        // SHA-256("hello")
        assert_eq!(
            form.upload("file").expect("present").sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
