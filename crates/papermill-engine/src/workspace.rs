// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scoped per-request workspaces.
//
// Every conversion request gets a private directory named after a fresh
// UUID, so concurrent requests can never observe each other's files even
// when callers upload identically-named documents.  The directory and its
// entire contents are removed when the workspace is released; drop glue
// makes the removal unconditional across every exit path, including panics
// and client disconnects that abort the handler mid-pipeline.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use papermill_core::error::{PapermillError, Result};

/// Allocates uniquely-named workspaces under a configured root directory.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    /// Parent directory holding all live workspaces.
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create an empty, exclusively-owned workspace directory.
    ///
    /// The name is derived from a random identifier, never from caller
    /// input, so collisions under concurrency are not a concern.  The only
    /// failure mode is the filesystem itself (out of space, bad root),
    /// reported as `ResourceExhausted`.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<Workspace> {
        let dir = self.root.join(Uuid::new_v4().to_string());

        tokio::fs::create_dir_all(&dir).await.map_err(|err| {
            PapermillError::ResourceExhausted(format!(
                "cannot create workspace {}: {}",
                dir.display(),
                err
            ))
        })?;

        debug!(workspace = %dir.display(), "workspace acquired");
        Ok(Workspace {
            dir,
            released: false,
        })
    }
}

/// A private filesystem scope for one request's intermediate files.
///
/// Owned exclusively by the request handling it.  Dropping the workspace
/// removes the directory and everything in it; [`Workspace::release`] does
/// the same explicitly and is idempotent.
#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
    released: bool,
}

impl Workspace {
    /// The workspace directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for an internally-named file inside the workspace.
    ///
    /// For caller-supplied names use [`Workspace::stage`], which sanitizes.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write an uploaded input file into the workspace under a sanitized
    /// filename and return its path.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub async fn stage(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let safe = sanitize_filename(name)?;
        let path = self.dir.join(&safe);

        tokio::fs::write(&path, bytes).await?;

        debug!(path = %path.display(), "input staged");
        Ok(path)
    }

    /// Remove the workspace and all its contents.  Safe to call more than
    /// once; a workspace that is never explicitly released is cleaned up on
    /// drop instead.
    pub fn release(mut self) {
        self.remove_dir();
    }

    fn remove_dir(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!(workspace = %self.dir.display(), "workspace released"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(
                    workspace = %self.dir.display(),
                    error = %err,
                    "failed to remove workspace"
                );
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.remove_dir();
    }
}

/// Validate a caller-supplied filename for staging.
///
/// Rejects anything that could escape the workspace: path separators,
/// parent-directory references, absolute paths, drive prefixes, and empty
/// names.  The name is rejected rather than mangled so the caller learns
/// about the problem.
fn sanitize_filename(name: &str) -> Result<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(PapermillError::InvalidInput("empty filename".into()));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(PapermillError::InvalidInput(format!(
            "filename {trimmed:?} is not allowed"
        )));
    }
    if trimmed.contains('/') || trimmed.contains('\\') || trimmed.contains(':') {
        return Err(PapermillError::InvalidInput(format!(
            "filename {trimmed:?} contains path separators"
        )));
    }
    if trimmed.contains('\0') {
        return Err(PapermillError::InvalidInput(
            "filename contains a NUL byte".into(),
        ));
    }

    Ok(trimmed.to_string())
}
