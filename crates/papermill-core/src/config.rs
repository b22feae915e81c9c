// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Runtime settings for the conversion service.
///
/// Engine executables are resolved from here exactly once at startup; a bare
/// program name is looked up on `PATH`, an absolute path is used as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Directory under which per-request workspaces are created.
    pub workspace_root: PathBuf,
    /// LibreOffice executable (office ↔ PDF conversion).
    pub soffice_path: PathBuf,
    /// Poppler's pdftoppm executable (PDF → page images).
    pub pdftoppm_path: PathBuf,
    /// Ghostscript executable (PDF compression).
    pub ghostscript_path: PathBuf,
    /// qpdf executable (encryption probe, password set/remove).
    pub qpdf_path: PathBuf,
    /// Hard limit on any single external-engine invocation, in seconds.
    pub engine_timeout_secs: u64,
    /// Maximum accepted size of one uploaded file, in bytes.
    pub max_upload_bytes: usize,
    /// Resolution for PDF rasterisation.
    pub raster_dpi: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 8080).into(),
            workspace_root: std::env::temp_dir().join("papermill"),
            soffice_path: PathBuf::from("soffice"),
            pdftoppm_path: PathBuf::from("pdftoppm"),
            ghostscript_path: PathBuf::from("gs"),
            qpdf_path: PathBuf::from("qpdf"),
            engine_timeout_secs: 120,
            max_upload_bytes: 100 * 1024 * 1024,
            raster_dpi: 180,
        }
    }
}
