// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Papermill conversion service.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PapermillError, Result};

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Fixed-layout paginated document.
    Pdf,
    /// Word processor document (.doc / .docx).
    Word,
    /// Spreadsheet (.xls / .xlsx).
    Excel,
    /// Presentation (.ppt / .pptx).
    PowerPoint,
    Jpeg,
    Png,
    Tiff,
}

impl DocumentKind {
    /// MIME type string for the Content-Type response header.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::PowerPoint => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
        }
    }

    /// Infer document kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" | "docx" => Some(Self::Word),
            "xls" | "xlsx" => Some(Self::Excel),
            "ppt" | "pptx" => Some(Self::PowerPoint),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// File extensions this kind is recognised under.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Pdf => &["pdf"],
            Self::Word => &["doc", "docx"],
            Self::Excel => &["xls", "xlsx"],
            Self::PowerPoint => &["ppt", "pptx"],
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Png => &["png"],
            Self::Tiff => &["tif", "tiff"],
        }
    }
}

/// Inclusive, 1-indexed page range as supplied by the caller (`"start-end"`).
///
/// Parsing rejects malformed or inverted ranges up front; whether the range
/// fits the actual document is only known after the file is opened and is
/// checked separately via [`PageRange::validate_against`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Parse a `"start-end"` string.
    ///
    /// Fails with `InvalidInput` when the separator is missing, either bound
    /// is non-numeric or zero, or the range is inverted.
    pub fn parse(raw: &str) -> Result<Self> {
        let (start_str, end_str) = raw.trim().split_once('-').ok_or_else(|| {
            PapermillError::InvalidInput(format!(
                "page range must be \"start-end\", got {raw:?}"
            ))
        })?;

        let start: u32 = start_str.trim().parse().map_err(|_| {
            PapermillError::InvalidInput(format!("page range start {start_str:?} is not a number"))
        })?;
        let end: u32 = end_str.trim().parse().map_err(|_| {
            PapermillError::InvalidInput(format!("page range end {end_str:?} is not a number"))
        })?;

        if start == 0 {
            return Err(PapermillError::InvalidInput(
                "page numbering starts at 1".into(),
            ));
        }
        if start > end {
            return Err(PapermillError::InvalidInput(format!(
                "page range {start}-{end} is inverted"
            )));
        }

        Ok(Self { start, end })
    }

    /// Check the range against the document's actual page count.
    pub fn validate_against(&self, page_count: u32) -> Result<()> {
        if self.end > page_count {
            return Err(PapermillError::OutOfRange(format!(
                "page range {}-{} exceeds the document's {} pages",
                self.start, self.end, page_count
            )));
        }
        Ok(())
    }

    /// Number of pages the range selects (never zero; start ≤ end is
    /// enforced at parse time).
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// Compression quality tier for the PDF compressor.
///
/// Tiers map to Ghostscript `-dPDFSETTINGS` profiles: stronger compression
/// means lower output quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionTier {
    /// Smallest file, lowest quality (`/screen`).
    Extreme,
    /// Balanced output (`/ebook`).
    Recommended,
    /// Least compression, highest quality (`/printer`).
    Low,
}

impl CompressionTier {
    /// Parse a caller-supplied mode string. Unknown tiers are rejected rather
    /// than silently defaulted.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "extreme" => Ok(Self::Extreme),
            "recommended" => Ok(Self::Recommended),
            "low" => Ok(Self::Low),
            other => Err(PapermillError::InvalidInput(format!(
                "unknown compression mode {other:?} (expected extreme, recommended, or low)"
            ))),
        }
    }

    /// The Ghostscript quality profile for this tier.
    pub fn quality_profile(&self) -> &'static str {
        match self {
            Self::Extreme => "/screen",
            Self::Recommended => "/ebook",
            Self::Low => "/printer",
        }
    }
}

/// Where a produced artifact's bytes live.
#[derive(Debug)]
pub enum ArtifactPayload {
    /// Assembled in memory (lopdf / printpdf / zip outputs).
    Bytes(Vec<u8>),
    /// Written to a workspace file by an external engine.
    File(PathBuf),
}

/// A produced output returned to the caller: payload plus the metadata the
/// result streamer needs to emit it.
#[derive(Debug)]
pub struct Artifact {
    pub payload: ArtifactPayload,
    /// Content-Type header value.
    pub content_type: &'static str,
    /// Suggested download filename.
    pub filename: String,
}

impl Artifact {
    /// An in-memory artifact.
    pub fn from_bytes(bytes: Vec<u8>, content_type: &'static str, filename: String) -> Self {
        Self {
            payload: ArtifactPayload::Bytes(bytes),
            content_type,
            filename,
        }
    }

    /// A file-backed artifact (the file lives inside a request workspace).
    pub fn from_file(path: PathBuf, content_type: &'static str, filename: String) -> Self {
        Self {
            payload: ArtifactPayload::File(path),
            content_type,
            filename,
        }
    }
}
