// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared application state.

use std::sync::Arc;

use papermill_core::config::ServiceConfig;
use papermill_engine::{EngineAdapter, EngineCatalog, WorkspaceManager};

/// Everything a request handler needs; cheap to clone per request.
///
/// Requests share no mutable state — the catalog and adapter are read-only
/// and every request acquires its own workspace.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub workspaces: WorkspaceManager,
    pub engines: EngineCatalog,
    pub adapter: EngineAdapter,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let workspaces = WorkspaceManager::new(&config.workspace_root);
        let engines = EngineCatalog::from_config(&config);

        Self {
            config: Arc::new(config),
            workspaces,
            engines,
            adapter: EngineAdapter::new(),
        }
    }
}
