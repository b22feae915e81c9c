// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// papermill-engine — Per-request scoped workspaces and the uniform adapter
// over the external conversion engines (LibreOffice, Poppler, Ghostscript,
// qpdf).

pub mod adapter;
pub mod catalog;
pub mod workspace;

pub use adapter::{EngineAdapter, EngineInvocation, EngineOutput, ExpectedOutput};
pub use catalog::{EngineCatalog, OfficeTarget};
pub use workspace::{Workspace, WorkspaceManager};
