// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine catalogue — resolves the concrete external engines once from
// configuration and builds the invocation for each operation.
//
// Four engines, each substitutable behind the adapter contract:
//
//   - LibreOffice (`soffice --headless`)  office ↔ fixed-layout conversion
//   - Poppler (`pdftoppm`)                PDF → per-page raster images
//   - Ghostscript (`gs`)                  PDF recompression
//   - qpdf                                encryption probe / set / remove

use std::path::{Path, PathBuf};
use std::time::Duration;

use papermill_core::config::ServiceConfig;
use papermill_core::types::CompressionTier;

use crate::adapter::{EngineInvocation, ExpectedOutput};

/// Engine names as they appear in errors and logs.
pub const LIBREOFFICE: &str = "libreoffice";
pub const PDFTOPPM: &str = "pdftoppm";
pub const GHOSTSCRIPT: &str = "ghostscript";
pub const QPDF: &str = "qpdf";

/// Filename prefix for rasterised page images inside a workspace.
const PAGE_PREFIX: &str = "page";

/// Output formats LibreOffice is asked to produce.
///
/// The export filter is selected per target rather than passing the bare
/// extension — LibreOffice picks better defaults with an explicit filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficeTarget {
    /// Word/Excel/PowerPoint → PDF.
    Pdf,
    /// PDF → editable Word document.
    Docx,
}

impl OfficeTarget {
    /// The `--convert-to` filter argument.
    fn filter(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf:writer_pdf_Export",
            Self::Docx => "docx:MS Word 2007 XML",
        }
    }

    /// Extension of the produced file.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

/// Resolved engine executables plus the invocation-level settings.
///
/// Built once at startup; requests only read from it.
#[derive(Debug, Clone)]
pub struct EngineCatalog {
    soffice: PathBuf,
    pdftoppm: PathBuf,
    ghostscript: PathBuf,
    qpdf: PathBuf,
    timeout: Duration,
    raster_dpi: u32,
}

impl EngineCatalog {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            soffice: config.soffice_path.clone(),
            pdftoppm: config.pdftoppm_path.clone(),
            ghostscript: config.ghostscript_path.clone(),
            qpdf: config.qpdf_path.clone(),
            timeout: Duration::from_secs(config.engine_timeout_secs),
            raster_dpi: config.raster_dpi,
        }
    }

    // -- LibreOffice ----------------------------------------------------------

    /// Convert an office document (or a PDF, for `Docx`) into `target`,
    /// writing next to nothing outside `outdir`.
    ///
    /// LibreOffice names its output after the input stem, so the expected
    /// path is derived here rather than passed in.  Concurrent instances
    /// sharing one user profile trip over each other's lockfiles, so each
    /// invocation gets a profile directory inside the workspace.
    pub fn office_convert(
        &self,
        input: &Path,
        outdir: &Path,
        target: OfficeTarget,
    ) -> EngineInvocation {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "converted".into());
        let expected = outdir.join(format!("{stem}.{}", target.extension()));

        let profile = outdir.join(".lo-profile");

        EngineInvocation {
            engine: LIBREOFFICE,
            program: self.soffice.clone(),
            args: vec![
                "--headless".into(),
                format!("-env:UserInstallation=file://{}", profile.display()),
                "--convert-to".into(),
                target.filter().into(),
                "--outdir".into(),
                outdir.display().to_string(),
                input.display().to_string(),
            ],
            expected: ExpectedOutput::File(expected),
            timeout: self.timeout,
        }
    }

    // -- Poppler --------------------------------------------------------------

    /// Render every page of a PDF as a JPEG in `outdir`.
    ///
    /// pdftoppm writes `page-1.jpg`, `page-2.jpg`, … (zero-padded when the
    /// document has ten or more pages); the adapter returns them in page
    /// order.
    pub fn rasterize(&self, input: &Path, outdir: &Path) -> EngineInvocation {
        let prefix = outdir.join(PAGE_PREFIX);

        EngineInvocation {
            engine: PDFTOPPM,
            program: self.pdftoppm.clone(),
            args: vec![
                "-jpeg".into(),
                "-r".into(),
                self.raster_dpi.to_string(),
                input.display().to_string(),
                prefix.display().to_string(),
            ],
            expected: ExpectedOutput::PagePrefix(prefix),
            timeout: self.timeout,
        }
    }

    // -- Ghostscript ----------------------------------------------------------

    /// Recompress a PDF with the tier's quality profile.
    pub fn compress(
        &self,
        input: &Path,
        output: &Path,
        tier: CompressionTier,
    ) -> EngineInvocation {
        EngineInvocation {
            engine: GHOSTSCRIPT,
            program: self.ghostscript.clone(),
            args: vec![
                "-sDEVICE=pdfwrite".into(),
                "-dCompatibilityLevel=1.4".into(),
                format!("-dPDFSETTINGS={}", tier.quality_profile()),
                "-dNOPAUSE".into(),
                "-dQUIET".into(),
                "-dBATCH".into(),
                format!("-sOutputFile={}", output.display()),
                input.display().to_string(),
            ],
            expected: ExpectedOutput::File(output.to_path_buf()),
            timeout: self.timeout,
        }
    }

    // -- qpdf -----------------------------------------------------------------

    /// Probe whether a PDF is encrypted.
    ///
    /// qpdf exits 0 for an encrypted file and 2 for an unencrypted one; the
    /// caller interprets the code via [`crate::adapter::EngineAdapter::execute`].
    pub fn probe_encryption(&self, input: &Path) -> EngineInvocation {
        EngineInvocation {
            engine: QPDF,
            program: self.qpdf.clone(),
            args: vec!["--is-encrypted".into(), input.display().to_string()],
            expected: ExpectedOutput::None,
            timeout: self.timeout,
        }
    }

    /// Encrypt a PDF, using the same secret as owner and user password
    /// (AES-256).
    pub fn encrypt(&self, input: &Path, output: &Path, password: &str) -> EngineInvocation {
        EngineInvocation {
            engine: QPDF,
            program: self.qpdf.clone(),
            args: vec![
                "--encrypt".into(),
                password.into(),
                password.into(),
                "256".into(),
                "--".into(),
                input.display().to_string(),
                output.display().to_string(),
            ],
            expected: ExpectedOutput::File(output.to_path_buf()),
            timeout: self.timeout,
        }
    }

    /// Re-save a PDF without protection, decrypting with `password` when one
    /// is supplied.
    pub fn decrypt(
        &self,
        input: &Path,
        output: &Path,
        password: Option<&str>,
    ) -> EngineInvocation {
        let mut args = Vec::new();
        if let Some(password) = password {
            args.push(format!("--password={password}"));
        }
        args.push("--decrypt".into());
        args.push(input.display().to_string());
        args.push(output.display().to_string());

        EngineInvocation {
            engine: QPDF,
            program: self.qpdf.clone(),
            args,
            expected: ExpectedOutput::File(output.to_path_buf()),
            timeout: self.timeout,
        }
    }
}
