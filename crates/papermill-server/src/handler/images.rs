// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Images → single PDF endpoint.

use axum::extract::{Multipart, State};
use tracing::info;

use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::pipeline;
use crate::state::AppState;
use crate::stream::ArtifactResponse;
use crate::upload::FormData;
use crate::validate;

/// `POST /api/tools/image-to-pdf`
pub async fn image_to_pdf(
    State(state): State<AppState>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> ApiResult<ArtifactResponse> {
    let form = FormData::read(multipart, state.config.max_upload_bytes).await?;
    let uploads = validate::require_uploads(&form, "images", 1)?;
    for upload in &uploads {
        validate::require_kind(upload, validate::IMAGES)?;
    }

    info!(
        caller = %identity,
        images = uploads.len(),
        "image composition requested"
    );

    Ok(pipeline::compose_images(&uploads).await?)
}
