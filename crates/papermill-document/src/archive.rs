// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ZIP packaging for multi-file results (one rasterised image per page).

use std::io::Write;

use tracing::{debug, instrument};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use papermill_core::error::{PapermillError, Result};

/// Bundle named entries into an in-memory ZIP archive, preserving order.
#[instrument(skip_all, fields(entries = entries.len()))]
pub fn zip_bundle(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(std::io::Cursor::new(&mut buffer));

    for (name, data) in entries {
        zip.start_file(name.as_str(), options)
            .map_err(|err| PapermillError::Archive(format!("cannot add {name}: {err}")))?;
        zip.write_all(data)
            .map_err(|err| PapermillError::Archive(format!("cannot write {name}: {err}")))?;
    }

    zip.finish()
        .map_err(|err| PapermillError::Archive(format!("cannot finalise archive: {err}")))?;

    debug!(bytes = buffer.len(), "archive assembled");
    Ok(buffer)
}
