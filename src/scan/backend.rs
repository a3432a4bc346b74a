//! # Backend Analysis Module
//!
//! Solo progetti Python: `flake8` e `vulture` sull'intera workspace.
//! L'exit code dei linter non viene controllato, ogni riga di output è un finding.

use crate::error::{EngineError, EngineResult};
use crate::file_manager::FileManager;
use crate::progress::ProgressReporter;
use crate::runner::{ToolInvocation, ToolRunner};
use std::path::Path;
use tracing::{debug, info};

/// Display name and executable of each linter, in run order
pub const LINTERS: &[(&str, &str)] = &[
    ("Flake8 (Code Style)", "flake8"),
    ("Vulture (Dead Code)", "vulture"),
];

/// Runs the Python linters over a workspace
pub struct BackendAnalyzer<'a> {
    runner: &'a ToolRunner,
    reporter: &'a ProgressReporter,
}

impl<'a> BackendAnalyzer<'a> {
    pub fn new(runner: &'a ToolRunner, reporter: &'a ProgressReporter) -> Self {
        Self { runner, reporter }
    }

    /// Stream every linter finding; returns how many lines were reported
    pub async fn run(&self, workspace: &Path) -> EngineResult<usize> {
        if !FileManager::contains_extension(workspace, "py") {
            self.reporter
                .error("This tool currently only supports Python projects for backend analysis.")
                .await;
            return Ok(0);
        }

        self.reporter
            .info("Python project detected. Running linters...")
            .await;

        let mut reported = 0;
        for (name, program) in LINTERS {
            reported += self.run_linter(workspace, name, program).await;
        }
        info!("Backend analysis reported {} line(s)", reported);
        Ok(reported)
    }

    async fn run_linter(&self, workspace: &Path, name: &str, program: &str) -> usize {
        self.reporter.info(format!("----- Running {} -----", name)).await;

        let invocation = ToolInvocation::new(program, workspace)
            .arg(".")
            .timeout(self.runner.timeouts().lint())
            .check_exit_code(false);

        match self.runner.run(invocation).await {
            Ok(result) if result.has_output() => {
                let mut lines = 0;
                for line in result.stdout_lines() {
                    self.reporter.warning(line).await;
                    lines += 1;
                }
                lines
            }
            Ok(result) if result.exit_code != 0 => {
                let stderr = result.stderr.trim();
                let reason = if stderr.is_empty() {
                    format!("{} failed with exit code {}", name, result.exit_code)
                } else {
                    stderr.to_string()
                };
                self.reporter
                    .error(format!("Failed to run {}. Is it installed? Error: {}", name, reason))
                    .await;
                0
            }
            Ok(_) => {
                self.reporter.success(format!("{} found no issues.", name)).await;
                0
            }
            Err(EngineError::ToolTimeout { .. }) => {
                self.reporter.error(format!("{} analysis timed out.", name)).await;
                0
            }
            Err(e) => {
                debug!("{} could not run: {}", program, e);
                self.reporter
                    .error(format!("Failed to run {}. Is it installed? Error: {}", name, e))
                    .await;
                0
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::ToolTimeouts;
    use crate::progress::StatusLevel;
    use crate::test_support::{FakeTools, RecordingSink};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn python_workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("app.py"), "import os\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_non_python_workspace_is_rejected() {
        let tools = FakeTools::new();
        let runner = ToolRunner::new(tools.resolver(), ToolTimeouts::default());
        let sink = Arc::new(RecordingSink::default());
        let reporter = ProgressReporter::new(sink.clone());

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.js"), "").unwrap();

        let reported = BackendAnalyzer::new(&runner, &reporter).run(dir.path()).await.unwrap();
        assert_eq!(reported, 0);
        assert!(sink.has_status("only supports Python projects", StatusLevel::Error));
        assert_eq!(sink.statuses().len(), 1);
    }

    #[tokio::test]
    async fn test_findings_clean_run_and_missing_tool() {
        let tools = FakeTools::new();
        tools.install(
            "flake8",
            "echo \"./app.py:1:1: F401 'os' imported but unused\"\necho \"./app.py:2:1: W391 blank line\"\nexit 1\n",
        );
        let runner = ToolRunner::new(tools.resolver(), ToolTimeouts::default());
        let sink = Arc::new(RecordingSink::default());
        let reporter = ProgressReporter::new(sink.clone());
        let workspace = python_workspace();

        let reported = BackendAnalyzer::new(&runner, &reporter)
            .run(workspace.path())
            .await
            .unwrap();

        assert_eq!(reported, 2);
        assert!(sink.has_status("F401 'os' imported but unused", StatusLevel::Warning));
        assert!(sink.has_status("----- Running Vulture (Dead Code) -----", StatusLevel::Info));
        assert!(sink.has_status(
            "Failed to run Vulture (Dead Code). Is it installed?",
            StatusLevel::Error
        ));
    }

    #[tokio::test]
    async fn test_silent_exit_codes() {
        let tools = FakeTools::new();
        tools.install("flake8", "exit 0\n");
        tools.install("vulture", "exit 3\n");
        let runner = ToolRunner::new(tools.resolver(), ToolTimeouts::default());
        let sink = Arc::new(RecordingSink::default());
        let reporter = ProgressReporter::new(sink.clone());
        let workspace = python_workspace();

        BackendAnalyzer::new(&runner, &reporter)
            .run(workspace.path())
            .await
            .unwrap();

        assert!(sink.has_status("Flake8 (Code Style) found no issues.", StatusLevel::Success));
        assert!(sink.has_status(
            "Vulture (Dead Code) failed with exit code 3",
            StatusLevel::Error
        ));
    }
}
