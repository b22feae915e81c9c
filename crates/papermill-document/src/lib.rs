// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// papermill-document — In-process document operations for Papermill.
//
// Provides page-level PDF manipulation (page counting, range extraction,
// in-order merge), composition of uploaded images into a single PDF, and
// ZIP packaging of per-page raster outputs.

pub mod archive;
pub mod pdf;

pub use pdf::compose::PdfComposer;
pub use pdf::pages::PdfPages;
