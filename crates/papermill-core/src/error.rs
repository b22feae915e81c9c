// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Papermill.

use thiserror::Error;

/// Top-level error type for all Papermill operations.
#[derive(Debug, Error)]
pub enum PapermillError {
    // -- Request validation --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    // -- Password operations --
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("document is already password-protected: {0}")]
    AlreadyProtected(String),

    // -- External engines --
    #[error("{engine} invocation failed: {detail}")]
    EngineFailure {
        engine: &'static str,
        detail: String,
    },

    #[error("{engine} exceeded the {seconds}s time limit and was killed")]
    EngineTimeout { engine: &'static str, seconds: u64 },

    #[error("{engine} exited successfully but the expected output {expected} was not created")]
    EngineOutputMissing {
        engine: &'static str,
        expected: String,
    },

    // -- Workspace --
    #[error("workspace allocation failed: {0}")]
    ResourceExhausted(String),

    // -- Document processing --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("archive packaging failed: {0}")]
    Archive(String),

    // -- Infrastructure --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PapermillError>;
