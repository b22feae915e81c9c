// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-operation request validation — file presence, format allow-lists, and
// parameter well-formedness.  Pure predicates over the parsed form; no side
// effects, and in particular no workspace is touched before these pass.

use papermill_core::error::{PapermillError, Result};
use papermill_core::types::DocumentKind;

use crate::upload::{FormData, Upload};

/// Accepted input formats per operation.
pub const WORD: &[DocumentKind] = &[DocumentKind::Word];
pub const EXCEL: &[DocumentKind] = &[DocumentKind::Excel];
pub const POWERPOINT: &[DocumentKind] = &[DocumentKind::PowerPoint];
pub const PDF: &[DocumentKind] = &[DocumentKind::Pdf];
pub const IMAGES: &[DocumentKind] = &[DocumentKind::Jpeg, DocumentKind::Png, DocumentKind::Tiff];

/// The named file field must be present and non-empty.
pub fn require_upload<'a>(form: &'a FormData, field: &str) -> Result<&'a Upload> {
    let upload = form
        .upload(field)
        .ok_or_else(|| PapermillError::InvalidInput(format!("no {field:?} file uploaded")))?;

    if upload.bytes.is_empty() {
        return Err(PapermillError::InvalidInput(format!(
            "uploaded file {:?} is empty",
            upload.filename
        )));
    }
    Ok(upload)
}

/// The named file field must carry at least `min` non-empty files.
pub fn require_uploads<'a>(
    form: &'a FormData,
    field: &str,
    min: usize,
) -> Result<Vec<&'a Upload>> {
    let uploads = form.uploads(field);

    if uploads.len() < min {
        return Err(PapermillError::InvalidInput(format!(
            "at least {min} {field:?} files are required, got {}",
            uploads.len()
        )));
    }
    for upload in &uploads {
        if upload.bytes.is_empty() {
            return Err(PapermillError::InvalidInput(format!(
                "uploaded file {:?} is empty",
                upload.filename
            )));
        }
    }
    Ok(uploads)
}

/// The upload's extension must resolve to one of the allowed formats.
pub fn require_kind(upload: &Upload, allowed: &[DocumentKind]) -> Result<DocumentKind> {
    let kind = upload
        .extension()
        .and_then(|ext| DocumentKind::from_extension(&ext));

    match kind {
        Some(kind) if allowed.contains(&kind) => Ok(kind),
        _ => {
            let expected: Vec<&str> = allowed
                .iter()
                .flat_map(|kind| kind.extensions())
                .copied()
                .collect();
            Err(PapermillError::InvalidInput(format!(
                "file {:?} is not a supported type (expected: {})",
                upload.filename,
                expected.join(", ")
            )))
        }
    }
}

/// A required text parameter.
pub fn require_param<'a>(form: &'a FormData, name: &str) -> Result<&'a str> {
    form.param(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| PapermillError::InvalidInput(format!("missing {name:?} parameter")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(filename: &str, bytes: &[u8]) -> Upload {
        Upload {
            field: "file".into(),
            filename: filename.into(),
            bytes: bytes.to_vec(),
            sha256: String::new(),
        }
    }

    #[test]
    fn kind_check_is_case_insensitive() {
        let pdf = upload("Report.PDF", b"x");
        assert_eq!(require_kind(&pdf, PDF).expect("accepted"), DocumentKind::Pdf);

        let docx = upload("letter.docx", b"x");
        assert_eq!(
            require_kind(&docx, WORD).expect("accepted"),
            DocumentKind::Word
        );
        assert!(require_kind(&docx, PDF).is_err());
    }

    #[test]
    fn rejection_lists_expected_extensions() {
        let err = require_kind(&upload("photo.webp", b"x"), IMAGES).expect_err("rejected");
        match err {
            PapermillError::InvalidInput(detail) => {
                assert!(detail.contains("jpg"));
                assert!(detail.contains("png"));
                assert!(detail.contains("tiff"));
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn missing_extension_is_rejected() {
        let bare = upload("README", b"x");
        assert!(matches!(
            require_kind(&bare, PDF),
            Err(PapermillError::InvalidInput(_))
        ));
    }

    #[test]
    fn missing_file_field_is_rejected() {
        let form = FormData::default();
        assert!(matches!(
            require_upload(&form, "file"),
            Err(PapermillError::InvalidInput(_))
        ));
    }

    #[test]
    fn missing_param_is_rejected() {
        let form = FormData::default();
        assert!(matches!(
            require_param(&form, "password"),
            Err(PapermillError::InvalidInput(_))
        ));
    }
}
