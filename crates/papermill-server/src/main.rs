// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Papermill — Stateless Document Transformation Service
//
// Entry point. Initialises logging, resolves configuration from flags and
// environment, and serves the conversion API until interrupted.

mod error;
mod handler;
mod identity;
mod pipeline;
mod router;
mod state;
mod stream;
mod upload;
mod validate;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use papermill_core::config::ServiceConfig;
use papermill_core::error::Result;

use crate::state::AppState;

/// Command-line and environment configuration.
#[derive(Debug, Parser)]
#[command(name = "papermill", version, about = "Document transformation service")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "PAPERMILL_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Root directory for per-request workspaces (defaults to the system
    /// temp directory).
    #[arg(long, env = "PAPERMILL_WORKSPACE_ROOT")]
    workspace_root: Option<PathBuf>,

    /// LibreOffice executable.
    #[arg(long, env = "PAPERMILL_SOFFICE", default_value = "soffice")]
    soffice: PathBuf,

    /// Poppler pdftoppm executable.
    #[arg(long, env = "PAPERMILL_PDFTOPPM", default_value = "pdftoppm")]
    pdftoppm: PathBuf,

    /// Ghostscript executable.
    #[arg(long, env = "PAPERMILL_GHOSTSCRIPT", default_value = "gs")]
    ghostscript: PathBuf,

    /// qpdf executable.
    #[arg(long, env = "PAPERMILL_QPDF", default_value = "qpdf")]
    qpdf: PathBuf,

    /// Kill an external engine after this many seconds.
    #[arg(long, env = "PAPERMILL_ENGINE_TIMEOUT_SECS", default_value_t = 120)]
    engine_timeout_secs: u64,

    /// Per-file upload cap, in megabytes.
    #[arg(long, env = "PAPERMILL_MAX_UPLOAD_MB", default_value_t = 100)]
    max_upload_mb: usize,

    /// Rasterisation resolution.
    #[arg(long, env = "PAPERMILL_RASTER_DPI", default_value_t = 180)]
    raster_dpi: u32,
}

impl Args {
    fn into_config(self) -> ServiceConfig {
        let defaults = ServiceConfig::default();
        ServiceConfig {
            bind_addr: self.bind,
            workspace_root: self.workspace_root.unwrap_or(defaults.workspace_root),
            soffice_path: self.soffice,
            pdftoppm_path: self.pdftoppm,
            ghostscript_path: self.ghostscript,
            qpdf_path: self.qpdf,
            engine_timeout_secs: self.engine_timeout_secs,
            max_upload_bytes: self.max_upload_mb * 1024 * 1024,
            raster_dpi: self.raster_dpi,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();
    tokio::fs::create_dir_all(&config.workspace_root).await?;

    tracing::info!(
        bind = %config.bind_addr,
        workspace_root = %config.workspace_root.display(),
        "Papermill starting"
    );

    let bind_addr = config.bind_addr;
    let app = router::build(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Papermill stopped");
    Ok(())
}

/// Resolve when the process receives an interrupt.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
