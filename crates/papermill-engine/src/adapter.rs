// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Uniform invocation contract over the external conversion engines.
//
// Every engine call goes through [`EngineAdapter::invoke`]: spawn, wait with
// a hard deadline, capture stderr into the log, and verify the expected
// output actually exists.  The output check matters — LibreOffice in
// particular can exit 0 without writing a file when an import filter bails
// out, so exit status alone is never trusted.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use papermill_core::error::{PapermillError, Result};

/// One planned external-engine call.
#[derive(Debug, Clone)]
pub struct EngineInvocation {
    /// Short engine name used in errors and logs ("libreoffice", "qpdf", …).
    pub engine: &'static str,
    /// Resolved executable.
    pub program: PathBuf,
    /// Full argument vector.
    pub args: Vec<String>,
    /// What the engine is expected to produce.
    pub expected: ExpectedOutput,
    /// Hard wall-clock limit; the process is killed when it is exceeded.
    pub timeout: Duration,
}

/// The artifact(s) an invocation must leave behind to count as successful.
#[derive(Debug, Clone)]
pub enum ExpectedOutput {
    /// A single file at a known path.
    File(PathBuf),
    /// A family of per-page files sharing a path prefix (pdftoppm writes
    /// `page-1.jpg`, `page-2.jpg`, … — zero-padded within one run).
    PagePrefix(PathBuf),
    /// Nothing — the exit status is the answer (qpdf `--is-encrypted`).
    None,
}

impl ExpectedOutput {
    /// Verify the expected artifacts exist, returning them in page order.
    ///
    /// Public for callers that interpret the exit status themselves via
    /// [`EngineAdapter::execute`] and still need the output check.
    pub fn verify(&self, engine: &'static str) -> Result<Vec<PathBuf>> {
        match self {
            Self::File(path) => {
                if path.is_file() {
                    Ok(vec![path.clone()])
                } else {
                    Err(PapermillError::EngineOutputMissing {
                        engine,
                        expected: path.display().to_string(),
                    })
                }
            }
            Self::PagePrefix(prefix) => {
                let dir = prefix.parent().ok_or_else(|| {
                    PapermillError::EngineOutputMissing {
                        engine,
                        expected: prefix.display().to_string(),
                    }
                })?;
                let stem = prefix
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();

                let mut pages: Vec<PathBuf> = std::fs::read_dir(dir)
                    .map_err(PapermillError::Io)?
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.file_name()
                            .map(|n| n.to_string_lossy().starts_with(&stem))
                            .unwrap_or(false)
                    })
                    .collect();

                if pages.is_empty() {
                    return Err(PapermillError::EngineOutputMissing {
                        engine,
                        expected: format!("{}*", prefix.display()),
                    });
                }

                // Page numbers are zero-padded to a uniform width within one
                // run, so (length, lexical) order is page order.
                pages.sort_by(|a, b| {
                    a.as_os_str()
                        .len()
                        .cmp(&b.as_os_str().len())
                        .then_with(|| a.cmp(b))
                });
                Ok(pages)
            }
            Self::None => Ok(Vec::new()),
        }
    }
}

/// Raw outcome of an engine run, for callers that interpret the exit status
/// themselves (encryption probes, password errors).
#[derive(Debug)]
pub struct EngineOutput {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Captured standard error.  Stays inside the process boundary — it is
    /// logged for diagnostics, never surfaced to HTTP callers.
    pub stderr: String,
}

impl EngineOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes [`EngineInvocation`]s.
///
/// The adapter is stateless; engine selection and argument construction live
/// in [`crate::catalog::EngineCatalog`].
#[derive(Debug, Clone, Default)]
pub struct EngineAdapter;

impl EngineAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Run an invocation to completion and return its raw outcome.
    ///
    /// A process that outlives the invocation's timeout is killed and
    /// reported as `EngineTimeout`.
    #[instrument(skip(self, invocation), fields(engine = invocation.engine))]
    pub async fn execute(&self, invocation: &EngineInvocation) -> Result<EngineOutput> {
        debug!(
            program = %invocation.program.display(),
            args = ?invocation.args,
            "spawning engine"
        );

        let child = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                let detail = if err.kind() == std::io::ErrorKind::NotFound {
                    format!("executable {} not found", invocation.program.display())
                } else {
                    format!("spawn failed: {err}")
                };
                PapermillError::EngineFailure {
                    engine: invocation.engine,
                    detail,
                }
            })?;

        // Dropping the wait future on timeout kills the child via
        // kill_on_drop, taking any partially-written output with it when the
        // workspace is released.
        let output = match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await
        {
            Ok(result) => result.map_err(|err| PapermillError::EngineFailure {
                engine: invocation.engine,
                detail: format!("wait failed: {err}"),
            })?,
            Err(_) => {
                warn!(
                    engine = invocation.engine,
                    timeout_secs = invocation.timeout.as_secs(),
                    "engine timed out and was killed"
                );
                return Err(PapermillError::EngineTimeout {
                    engine: invocation.engine,
                    seconds: invocation.timeout.as_secs(),
                });
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !stderr.is_empty() {
            debug!(engine = invocation.engine, stderr = %stderr, "engine stderr");
        }

        Ok(EngineOutput {
            code: output.status.code(),
            stderr,
        })
    }

    /// Run an invocation, require success, and verify the expected output.
    ///
    /// Returns the produced artifact paths (one for `File`, page-ordered for
    /// `PagePrefix`).  Engine stderr is logged but the returned errors carry
    /// only the exit code.
    pub async fn invoke(&self, invocation: &EngineInvocation) -> Result<Vec<PathBuf>> {
        let output = self.execute(invocation).await?;

        if !output.success() {
            warn!(
                engine = invocation.engine,
                code = ?output.code,
                stderr = %output.stderr,
                "engine reported failure"
            );
            return Err(PapermillError::EngineFailure {
                engine: invocation.engine,
                detail: match output.code {
                    Some(code) => format!("exit code {code}"),
                    None => "terminated by signal".into(),
                },
            });
        }

        invocation.expected.verify(invocation.engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shell one-liner invocation for exercising the adapter.
    fn shell(script: String, expected: ExpectedOutput) -> EngineInvocation {
        EngineInvocation {
            engine: "test-shell",
            program: PathBuf::from("sh"),
            args: vec!["-c".into(), script],
            expected,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn invoke_returns_created_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("result.txt");

        let invocation = shell(
            format!("printf converted > {}", out.display()),
            ExpectedOutput::File(out.clone()),
        );

        let produced = EngineAdapter::new()
            .invoke(&invocation)
            .await
            .expect("invoke");
        assert_eq!(produced, vec![out.clone()]);
        assert_eq!(std::fs::read(&out).expect("read"), b"converted");
    }

    #[tokio::test]
    async fn nonzero_exit_is_engine_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("never.txt");

        let invocation = shell("exit 3".into(), ExpectedOutput::File(out));
        let err = EngineAdapter::new()
            .invoke(&invocation)
            .await
            .expect_err("should fail");

        match err {
            PapermillError::EngineFailure { engine, detail } => {
                assert_eq!(engine, "test-shell");
                assert!(detail.contains("3"));
            }
            other => panic!("expected EngineFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_without_output_is_output_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("ghost.pdf");

        let invocation = shell("exit 0".into(), ExpectedOutput::File(out));
        let err = EngineAdapter::new()
            .invoke(&invocation)
            .await
            .expect_err("should fail");

        assert!(matches!(
            err,
            PapermillError::EngineOutputMissing { engine: "test-shell", .. }
        ));
    }

    #[tokio::test]
    async fn slow_engine_is_killed_and_reported() {
        let invocation = EngineInvocation {
            engine: "test-shell",
            program: PathBuf::from("sh"),
            args: vec!["-c".into(), "sleep 30".into()],
            expected: ExpectedOutput::None,
            timeout: Duration::from_millis(100),
        };

        let err = EngineAdapter::new()
            .execute(&invocation)
            .await
            .expect_err("should time out");
        assert!(matches!(err, PapermillError::EngineTimeout { .. }));
    }

    #[tokio::test]
    async fn execute_exposes_exit_code() {
        let invocation = shell("exit 2".into(), ExpectedOutput::None);
        let output = EngineAdapter::new()
            .execute(&invocation)
            .await
            .expect("execute");
        assert_eq!(output.code, Some(2));
        assert!(!output.success());
    }

    #[tokio::test]
    async fn page_prefix_outputs_come_back_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefix = dir.path().join("page");

        let invocation = shell(
            format!(
                "touch {0}-1.jpg {0}-2.jpg {0}-3.jpg",
                prefix.display()
            ),
            ExpectedOutput::PagePrefix(prefix.clone()),
        );

        let pages = EngineAdapter::new()
            .invoke(&invocation)
            .await
            .expect("invoke");
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-1.jpg", "page-2.jpg", "page-3.jpg"]);
    }

    #[tokio::test]
    async fn page_prefix_with_no_pages_is_output_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefix = dir.path().join("page");

        let invocation = shell("exit 0".into(), ExpectedOutput::PagePrefix(prefix));
        let err = EngineAdapter::new()
            .invoke(&invocation)
            .await
            .expect_err("should fail");
        assert!(matches!(err, PapermillError::EngineOutputMissing { .. }));
    }

    #[tokio::test]
    async fn missing_executable_is_engine_failure() {
        let invocation = EngineInvocation {
            engine: "test-shell",
            program: PathBuf::from("papermill-no-such-binary"),
            args: Vec::new(),
            expected: ExpectedOutput::None,
            timeout: Duration::from_secs(1),
        };

        let err = EngineAdapter::new()
            .execute(&invocation)
            .await
            .expect_err("should fail");
        match err {
            PapermillError::EngineFailure { detail, .. } => {
                assert!(detail.contains("not found"));
            }
            other => panic!("expected EngineFailure, got {other:?}"),
        }
    }
}
