// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF → page-image archive endpoint (pdftoppm-backed).

use axum::extract::{Multipart, State};
use tracing::info;

use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::pipeline;
use crate::state::AppState;
use crate::stream::ArtifactResponse;
use crate::upload::FormData;
use crate::validate;

/// `POST /api/tools/pdf-to-image`
pub async fn pdf_to_image(
    State(state): State<AppState>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> ApiResult<ArtifactResponse> {
    let form = FormData::read(multipart, state.config.max_upload_bytes).await?;
    let upload = validate::require_upload(&form, "file")?;
    validate::require_kind(upload, validate::PDF)?;

    info!(
        caller = %identity,
        file = %upload.filename,
        sha256 = %upload.sha256,
        "rasterisation requested"
    );

    Ok(pipeline::rasterize(&state, upload).await?)
}
