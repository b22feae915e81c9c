// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-level endpoints: split by range, merge in upload order.

use axum::extract::{Multipart, State};
use tracing::info;

use papermill_core::types::PageRange;

use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::pipeline;
use crate::state::AppState;
use crate::stream::ArtifactResponse;
use crate::upload::FormData;
use crate::validate;

/// `POST /api/tools/pdf-split`
pub async fn split_pdf(
    State(state): State<AppState>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> ApiResult<ArtifactResponse> {
    let form = FormData::read(multipart, state.config.max_upload_bytes).await?;
    let upload = validate::require_upload(&form, "file")?;
    validate::require_kind(upload, validate::PDF)?;

    // Range syntax is checked before anything else happens; whether the
    // range fits the document is the pipeline's job.
    let range = PageRange::parse(validate::require_param(&form, "ranges")?)?;

    info!(
        caller = %identity,
        file = %upload.filename,
        sha256 = %upload.sha256,
        start = range.start,
        end = range.end,
        "split requested"
    );

    Ok(pipeline::split(upload, range).await?)
}

/// `POST /api/tools/pdf-merge`
pub async fn merge_pdfs(
    State(state): State<AppState>,
    identity: CallerIdentity,
    multipart: Multipart,
) -> ApiResult<ArtifactResponse> {
    let form = FormData::read(multipart, state.config.max_upload_bytes).await?;
    let uploads = validate::require_uploads(&form, "files", 2)?;
    for upload in &uploads {
        validate::require_kind(upload, validate::PDF)?;
    }

    info!(caller = %identity, documents = uploads.len(), "merge requested");

    Ok(pipeline::merge(&uploads).await?)
}
