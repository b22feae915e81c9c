// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password endpoints: protect, unlock, and their status probes (qpdf-backed).
//
// The protect tool takes its upload under `pdf`; both probes and the unlock
// tool use `pdfFile`.  The field names are part of the public surface the
// web frontend depends on.

use axum::Json;
use axum::extract::{Multipart, State};
use serde_json::Value;
use tracing::info;

use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::pipeline;
use crate::state::AppState;
use crate::stream::ArtifactResponse;
use crate::upload::FormData;
use crate::validate;

/// `POST /api/tools/password-protect`
pub async fn protect(
    State(state): State<AppState>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> ApiResult<ArtifactResponse> {
    let form = FormData::read(multipart, state.config.max_upload_bytes).await?;
    let upload = validate::require_upload(&form, "pdf")?;
    validate::require_kind(upload, validate::PDF)?;
    let password = validate::require_param(&form, "password")?;

    info!(
        caller = %identity,
        file = %upload.filename,
        sha256 = %upload.sha256,
        "protect requested"
    );

    Ok(pipeline::protect(&state, upload, password).await?)
}

/// `POST /api/tools/password-protect/check`
pub async fn protect_check(
    State(state): State<AppState>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let form = FormData::read(multipart, state.config.max_upload_bytes).await?;
    let upload = validate::require_upload(&form, "pdfFile")?;
    validate::require_kind(upload, validate::PDF)?;

    info!(caller = %identity, file = %upload.filename, "protect status check");

    Ok(Json(pipeline::protect_check(&state, upload).await?))
}

/// `POST /api/tools/unlock-pdf/unlock`
pub async fn unlock(
    State(state): State<AppState>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> ApiResult<ArtifactResponse> {
    let form = FormData::read(multipart, state.config.max_upload_bytes).await?;
    let upload = validate::require_upload(&form, "pdfFile")?;
    validate::require_kind(upload, validate::PDF)?;

    // The password is only mandatory for encrypted inputs; the pipeline
    // decides after probing the document.
    let password = form.param("password").filter(|p| !p.is_empty());

    info!(
        caller = %identity,
        file = %upload.filename,
        sha256 = %upload.sha256,
        "unlock requested"
    );

    Ok(pipeline::unlock(&state, upload, password).await?)
}

/// `POST /api/tools/unlock-pdf/check`
pub async fn unlock_check(
    State(state): State<AppState>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let form = FormData::read(multipart, state.config.max_upload_bytes).await?;
    let upload = validate::require_upload(&form, "pdfFile")?;
    validate::require_kind(upload, validate::PDF)?;

    info!(caller = %identity, file = %upload.filename, "unlock status check");

    Ok(Json(pipeline::unlock_check(&state, upload).await?))
}
