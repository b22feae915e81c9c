// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Office ↔ fixed-layout conversion endpoints (LibreOffice-backed).

use axum::extract::{Multipart, State};
use tracing::info;

use papermill_core::types::DocumentKind;
use papermill_engine::OfficeTarget;

use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::pipeline;
use crate::state::AppState;
use crate::stream::ArtifactResponse;
use crate::upload::FormData;
use crate::validate;

/// Shared body of the four office-conversion routes.
async fn convert(
    state: AppState,
    identity: CallerIdentity,
    multipart: Multipart,
    allowed: &[DocumentKind],
    target: OfficeTarget,
) -> ApiResult<ArtifactResponse> {
    let form = FormData::read(multipart, state.config.max_upload_bytes).await?;
    let upload = validate::require_upload(&form, "file")?;
    validate::require_kind(upload, allowed)?;

    info!(
        caller = %identity,
        file = %upload.filename,
        sha256 = %upload.sha256,
        "office conversion requested"
    );

    Ok(pipeline::office_convert(&state, upload, target).await?)
}

/// `POST /api/tools/word-to-pdf`
pub async fn word_to_pdf(
    State(state): State<AppState>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> ApiResult<ArtifactResponse> {
    convert(
        state,
        identity,
        multipart,
        validate::WORD,
        OfficeTarget::Pdf,
    )
    .await
}

/// `POST /api/tools/excel-to-pdf`
pub async fn excel_to_pdf(
    State(state): State<AppState>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> ApiResult<ArtifactResponse> {
    convert(
        state,
        identity,
        multipart,
        validate::EXCEL,
        OfficeTarget::Pdf,
    )
    .await
}

/// `POST /api/tools/powerpoint-to-pdf`
pub async fn powerpoint_to_pdf(
    State(state): State<AppState>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> ApiResult<ArtifactResponse> {
    convert(
        state,
        identity,
        multipart,
        validate::POWERPOINT,
        OfficeTarget::Pdf,
    )
    .await
}

/// `POST /api/tools/pdf-to-word`
pub async fn pdf_to_word(
    State(state): State<AppState>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> ApiResult<ArtifactResponse> {
    convert(
        state,
        identity,
        multipart,
        validate::PDF,
        OfficeTarget::Docx,
    )
    .await
}
