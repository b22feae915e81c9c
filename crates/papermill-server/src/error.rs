// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP error mapping.
//
// Every failure crosses the wire as `{"error": <message>}` with the status
// code its taxonomy kind dictates.  Engine stderr never reaches this layer;
// by the time an error is serialised here it carries only the error kind and
// a short detail string.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use papermill_core::error::PapermillError;

/// Wrapper so the core error can implement axum's response conversion.
#[derive(Debug)]
pub struct ApiError(pub PapermillError);

/// Handler result alias.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<PapermillError> for ApiError {
    fn from(err: PapermillError) -> Self {
        Self(err)
    }
}

/// HTTP status for each taxonomy kind.
fn status_for(err: &PapermillError) -> StatusCode {
    match err {
        PapermillError::InvalidInput(_)
        | PapermillError::OutOfRange(_)
        | PapermillError::AlreadyProtected(_)
        | PapermillError::Pdf(_)
        | PapermillError::Image(_) => StatusCode::BAD_REQUEST,
        PapermillError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
        PapermillError::EngineTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        PapermillError::ResourceExhausted(_) => StatusCode::INSUFFICIENT_STORAGE,
        PapermillError::EngineFailure { .. }
        | PapermillError::EngineOutputMissing { .. }
        | PapermillError::Archive(_)
        | PapermillError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = self.0.to_string();

        if status.is_server_error() {
            error!(status = %status, error = %message, "request failed");
        } else {
            warn!(status = %status, error = %message, "request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
