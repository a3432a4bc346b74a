//! # External Tool Runner
//!
//! Uniform contract for every external process the engine starts.
//!
//! - Explicit argument vectors, never a shell string
//! - A per-invocation timeout; the child is killed when it elapses
//! - `check_exit_code`: linters and auditors exit non-zero to *report findings*,
//!   so their callers turn the flag off and branch on the captured output
//! - stdout/stderr are always captured as text

use crate::config::ToolTimeouts;
use crate::error::{EngineError, EngineResult};
use crate::tool_resolver::ToolPathResolver;
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// One external tool call
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    program: String,
    args: Vec<OsString>,
    cwd: PathBuf,
    timeout: Option<Duration>,
    check_exit_code: bool,
}

impl ToolInvocation {
    /// New invocation of `program` in `cwd`; exit codes are checked by default
    pub fn new(program: &str, cwd: &Path) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            timeout: None,
            check_exit_code: true,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn check_exit_code(mut self, check: bool) -> Self {
        self.check_exit_code = check;
        self
    }
}

/// Result of any external tool call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolInvocationResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
}

impl ToolInvocationResult {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }

    /// True when the tool printed something on stdout
    pub fn has_output(&self) -> bool {
        !self.stdout.trim().is_empty()
    }

    /// Non-empty stdout lines, trimmed
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

/// Runs external tools resolved through a [`ToolPathResolver`]
#[derive(Debug, Clone)]
pub struct ToolRunner {
    resolver: ToolPathResolver,
    timeouts: ToolTimeouts,
}

impl ToolRunner {
    pub fn new(resolver: ToolPathResolver, timeouts: ToolTimeouts) -> Self {
        Self { resolver, timeouts }
    }

    pub fn timeouts(&self) -> &ToolTimeouts {
        &self.timeouts
    }

    /// Run a tool, turning a timeout into [`EngineError::ToolTimeout`] and,
    /// when requested, a non-zero exit into [`EngineError::ToolExecutionFailed`]
    pub async fn run(&self, invocation: ToolInvocation) -> EngineResult<ToolInvocationResult> {
        let timeout = invocation
            .timeout
            .unwrap_or_else(|| self.timeouts.default_timeout());
        let program = invocation.program.clone();
        let check_exit_code = invocation.check_exit_code;

        let result = self.execute(invocation).await?;

        if result.timed_out {
            return Err(EngineError::ToolTimeout {
                tool: program,
                after: timeout,
            });
        }

        if check_exit_code && result.exit_code != 0 {
            let stderr = result.stderr.trim();
            return Err(EngineError::ToolExecutionFailed {
                tool: program,
                code: result.exit_code,
                stderr: if stderr.is_empty() {
                    result.stdout.trim().to_string()
                } else {
                    stderr.to_string()
                },
            });
        }

        Ok(result)
    }

    /// Run a tool and report whatever happened, timeouts included, as a result value
    pub async fn execute(&self, invocation: ToolInvocation) -> EngineResult<ToolInvocationResult> {
        let tool_path = self
            .resolver
            .resolve_tool(&invocation.program)
            .ok_or_else(|| EngineError::ToolNotFound(invocation.program.clone()))?;
        let timeout = invocation
            .timeout
            .unwrap_or_else(|| self.timeouts.default_timeout());

        debug!(
            "Running {:?} {:?} in {}",
            tool_path,
            invocation.args,
            invocation.cwd.display()
        );

        let mut cmd = Command::new(&tool_path);
        cmd.args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::ToolNotFound(invocation.program.clone())
            } else {
                EngineError::Workspace(e)
            }
        })?;

        let start_time = Instant::now();
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let result = ToolInvocationResult {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code: output.status.code().unwrap_or(-1),
                    timed_out: false,
                };
                debug!(
                    "{} exited with {} in {:?}",
                    invocation.program,
                    result.exit_code,
                    start_time.elapsed()
                );
                Ok(result)
            }
            Ok(Err(e)) => Err(EngineError::Workspace(e)),
            Err(_) => {
                // Dropping the wait future drops the child, which kills it.
                warn!("{} timed out after {:?}", invocation.program, timeout);
                Ok(ToolInvocationResult {
                    exit_code: -1,
                    timed_out: true,
                    ..ToolInvocationResult::default()
                })
            }
        }
    }
}
