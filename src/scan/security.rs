//! # Security Scan
//!
//! Tre fasi, nell'ordine:
//! 1. `requirements.txt` presente: `pip-audit` sulle dipendenze Python
//! 2. piano `premium`/`pro` e `package-lock.json` presente: `npm install`, poi
//!    `npm audit --json`. L'install esegue gli script dei pacchetti del progetto,
//!    il rischio viene segnalato al client prima di avviarlo.
//! 3. scan euristico di segreti e flag di debug
//!
//! Ogni finding viene trasmesso come evento `error` e conteggiato; il riepilogo
//! finale riporta il totale.

use crate::account::PlanTier;
use crate::error::{EngineError, EngineResult};
use crate::progress::ProgressReporter;
use crate::runner::{ToolInvocation, ToolRunner};
use crate::scan::heuristics::{HeuristicKind, SourceScanner};
use crate::scan::{FindingLog, ScanFinding};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
struct NpmAuditReport {
    #[serde(default)]
    vulnerabilities: BTreeMap<String, NpmVulnerability>,
}

#[derive(Debug, Deserialize)]
struct NpmVulnerability {
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    via: Vec<NpmVia>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NpmVia {
    Package(String),
    Advisory {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl NpmVia {
    fn describe(&self) -> Option<&str> {
        match self {
            NpmVia::Package(name) => Some(name),
            NpmVia::Advisory { title, name } => title.as_deref().or(name.as_deref()),
        }
    }
}

/// One finding per entry of the `vulnerabilities` map of `npm audit --json`
pub fn parse_npm_audit(stdout: &str) -> EngineResult<Vec<String>> {
    let report: NpmAuditReport = serde_json::from_str(stdout)
        .map_err(|e| EngineError::Format(format!("npm audit output is not valid JSON: {e}")))?;

    Ok(report
        .vulnerabilities
        .iter()
        .map(|(name, details)| {
            format!(
                "VULNERABILITY: {} ({}) in {}",
                name,
                details.severity.as_deref().unwrap_or("unknown"),
                details
                    .via
                    .first()
                    .and_then(NpmVia::describe)
                    .unwrap_or("N/A")
            )
        })
        .collect())
}

pub struct SecurityScanner<'a> {
    runner: &'a ToolRunner,
    reporter: &'a ProgressReporter,
    cache_dir: PathBuf,
    plan: PlanTier,
}

impl<'a> SecurityScanner<'a> {
    pub fn new(
        runner: &'a ToolRunner,
        reporter: &'a ProgressReporter,
        cache_dir: &Path,
        plan: PlanTier,
    ) -> Self {
        Self {
            runner,
            reporter,
            cache_dir: cache_dir.to_path_buf(),
            plan,
        }
    }

    /// Run every applicable stage; returns the total finding count
    pub async fn run(&self, workspace: &Path) -> EngineResult<usize> {
        let mut log = FindingLog::new(self.reporter);

        let requirements = workspace.join("requirements.txt");
        if requirements.is_file() {
            self.audit_python(workspace, &requirements, &mut log).await;
        }

        if self.plan.includes_node_audit() && workspace.join("package-lock.json").is_file() {
            self.audit_node(workspace, &mut log).await;
        }

        self.scan_sources(workspace, &mut log).await?;

        let findings = log.count();
        if findings == 0 {
            self.reporter
                .success("Scan complete. No obvious high-risk issues found.")
                .await;
        } else {
            self.reporter
                .warning(format!(
                    "Scan complete. Found {} potential issue(s). Review log carefully.",
                    findings
                ))
                .await;
        }
        info!("Security scan finished with {} finding(s)", findings);
        Ok(findings)
    }

    async fn audit_python(&self, workspace: &Path, requirements: &Path, log: &mut FindingLog<'_>) {
        self.reporter.info("--- Scanning Python Dependencies ---").await;
        self.reporter
            .info("Auditing requirements.txt with pip-audit...")
            .await;

        let invocation = ToolInvocation::new("pip-audit", workspace)
            .arg("-r")
            .arg(requirements)
            .arg("--cache-dir")
            .arg(self.cache_dir.join("pip"))
            .timeout(self.runner.timeouts().pip_audit())
            .check_exit_code(false);

        match self.runner.run(invocation).await {
            Ok(result) if result.stdout.contains("vulnerabilities found") => {
                for line in result.stdout_lines() {
                    log.record(ScanFinding::high_risk(line)).await;
                }
            }
            Ok(result) if result.exit_code != 0 => {
                let stderr = result.stderr.trim();
                let reason = if stderr.is_empty() {
                    format!("pip-audit failed with exit code {}", result.exit_code)
                } else {
                    stderr.to_string()
                };
                self.reporter
                    .error(format!("Failed to run pip-audit: {}", reason))
                    .await;
            }
            Ok(_) => {
                self.reporter
                    .success("No known vulnerabilities found in Python dependencies.")
                    .await;
            }
            Err(EngineError::ToolTimeout { .. }) => {
                self.reporter.error("Python dependency scan timed out.").await;
            }
            Err(e) => {
                self.reporter
                    .error(format!("Failed to run pip-audit: {}", e))
                    .await;
            }
        }
    }

    async fn audit_node(&self, workspace: &Path, log: &mut FindingLog<'_>) {
        self.reporter
            .info("--- Scanning Node.js Dependencies (Premium) ---")
            .await;
        self.reporter
            .warning(concat!(
                "Running 'npm install' to prepare for audit (max 5 mins). ",
                "Package install scripts from this project will run."
            ))
            .await;

        let install = ToolInvocation::new("npm", workspace)
            .arg("install")
            .timeout(self.runner.timeouts().npm_install());
        match self.runner.run(install).await {
            Ok(_) => {}
            Err(EngineError::ToolTimeout { .. }) => {
                self.reporter
                    .error("Node.js dependency installation (npm install) timed out.")
                    .await;
                return;
            }
            Err(e) => {
                warn!("npm install failed: {}", e);
                self.reporter
                    .error(format!("Failed to run npm audit: {}", e))
                    .await;
                return;
            }
        }

        self.reporter
            .info("Auditing with 'npm audit' (max 2 mins)...")
            .await;
        let audit = ToolInvocation::new("npm", workspace)
            .args(["audit", "--json"])
            .timeout(self.runner.timeouts().npm_audit())
            .check_exit_code(false);

        match self.runner.run(audit).await {
            Ok(result) if result.has_output() => match parse_npm_audit(&result.stdout) {
                Ok(findings) if findings.is_empty() => {
                    self.reporter
                        .success("No known vulnerabilities found in Node.js dependencies.")
                        .await;
                }
                Ok(findings) => {
                    for finding in findings {
                        log.record(ScanFinding::high_risk(finding)).await;
                    }
                }
                Err(e) => {
                    self.reporter
                        .error(format!("Failed to run npm audit: {}", e))
                        .await;
                }
            },
            Ok(result) if result.exit_code != 0 => {
                let stderr = result.stderr.trim();
                let reason = if stderr.is_empty() {
                    "npm audit failed without providing a reason."
                } else {
                    stderr
                };
                self.reporter
                    .error(format!("Failed to run npm audit: {}", reason))
                    .await;
            }
            Ok(_) => {
                self.reporter
                    .success("No known vulnerabilities found in Node.js dependencies.")
                    .await;
            }
            Err(EngineError::ToolTimeout { .. }) => {
                self.reporter
                    .error("Node.js dependency audit (npm audit) timed out.")
                    .await;
            }
            Err(e) => {
                self.reporter
                    .error(format!("Failed to run npm audit: {}", e))
                    .await;
            }
        }
    }

    async fn scan_sources(&self, workspace: &Path, log: &mut FindingLog<'_>) -> EngineResult<()> {
        self.reporter
            .info("--- Scanning Source Code for Secrets & Debug Flags ---")
            .await;

        let findings = SourceScanner::scan(workspace).await?;
        let mut secrets = 0;
        let mut debug_flags = 0;
        for finding in &findings {
            match finding.kind {
                HeuristicKind::HardcodedSecret => secrets += 1,
                HeuristicKind::DebugFlag => debug_flags += 1,
            }
            log.record(finding.into()).await;
        }

        if secrets == 0 {
            log.reporter()
                .success("No obvious hardcoded secrets found.")
                .await;
        }
        if debug_flags == 0 {
            log.reporter()
                .success("No obvious debug flags found enabled.")
                .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolTimeouts;
    use crate::progress::StatusLevel;
    use crate::test_support::{FakeTools, RecordingSink};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_npm_audit_parsing() {
        let stdout = r#"{
            "auditReportVersion": 2,
            "vulnerabilities": {
                "lodash": {"name": "lodash", "severity": "high", "via": [{"source": 1, "name": "lodash", "title": "Prototype Pollution"}]},
                "minimist": {"name": "minimist", "severity": "critical", "via": ["mkdirp"]},
                "orphan": {"name": "orphan", "severity": "low", "via": []}
            }
        }"#;

        let findings = parse_npm_audit(stdout).unwrap();
        assert_eq!(
            findings,
            vec![
                "VULNERABILITY: lodash (high) in Prototype Pollution",
                "VULNERABILITY: minimist (critical) in mkdirp",
                "VULNERABILITY: orphan (low) in N/A",
            ]
        );
        assert!(parse_npm_audit(r#"{"vulnerabilities": {}}"#).unwrap().is_empty());
        assert!(parse_npm_audit("npm ERR!").is_err());
    }

    #[tokio::test]
    async fn test_hardcoded_password_is_a_finding() {
        let tools = FakeTools::new();
        let runner = ToolRunner::new(tools.resolver(), ToolTimeouts::default());
        let sink = Arc::new(RecordingSink::default());
        let reporter = ProgressReporter::new(sink.clone());
        let cache = TempDir::new().unwrap();

        let workspace = TempDir::new().unwrap();
        std::fs::write(
            workspace.path().join("settings.py"),
            "PASSWORD = \"abcdefghijklmnop\"\n",
        )
        .unwrap();

        let findings = SecurityScanner::new(&runner, &reporter, cache.path(), PlanTier::Free)
            .run(workspace.path())
            .await
            .unwrap();

        assert_eq!(findings, 1);
        assert!(sink.has_status(
            "HIGH RISK: Potential hardcoded secret in 'settings.py' on line 1.",
            StatusLevel::Error
        ));
        assert!(sink.has_status("No obvious debug flags found enabled.", StatusLevel::Success));
        assert!(sink.has_status("Found 1 potential issue(s)", StatusLevel::Warning));
    }

    #[tokio::test]
    async fn test_clean_workspace_summary() {
        let tools = FakeTools::new();
        let runner = ToolRunner::new(tools.resolver(), ToolTimeouts::default());
        let sink = Arc::new(RecordingSink::default());
        let reporter = ProgressReporter::new(sink.clone());
        let cache = TempDir::new().unwrap();

        let workspace = TempDir::new().unwrap();
        std::fs::write(workspace.path().join("main.py"), "print('hello')\n").unwrap();
        // node audit is premium only, so npm is never needed here
        std::fs::write(workspace.path().join("package-lock.json"), "{}").unwrap();

        let findings = SecurityScanner::new(&runner, &reporter, cache.path(), PlanTier::Free)
            .run(workspace.path())
            .await
            .unwrap();

        assert_eq!(findings, 0);
        assert!(sink.has_status("No obvious hardcoded secrets found.", StatusLevel::Success));
        assert!(sink.has_status(
            "Scan complete. No obvious high-risk issues found.",
            StatusLevel::Success
        ));
        assert!(!sink.has_status("Node.js", StatusLevel::Info));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dependency_audits() {
        let tools = FakeTools::new();
        tools.install(
            "pip-audit",
            "echo 'Found 1 known vulnerabilities found in 1 package'\necho ''\necho 'flask 0.12 PYSEC-2018-66'\nexit 1\n",
        );
        tools.install(
            "npm",
            "if [ \"$1\" = \"install\" ]; then exit 0; fi\necho '{\"vulnerabilities\":{\"axios\":{\"severity\":\"moderate\",\"via\":[\"follow-redirects\"]}}}'\nexit 1\n",
        );
        let runner = ToolRunner::new(tools.resolver(), ToolTimeouts::default());
        let sink = Arc::new(RecordingSink::default());
        let reporter = ProgressReporter::new(sink.clone());
        let cache = TempDir::new().unwrap();

        let workspace = TempDir::new().unwrap();
        std::fs::write(workspace.path().join("requirements.txt"), "flask==0.12\n").unwrap();
        std::fs::write(workspace.path().join("package-lock.json"), "{}").unwrap();

        let findings = SecurityScanner::new(&runner, &reporter, cache.path(), PlanTier::Premium)
            .run(workspace.path())
            .await
            .unwrap();

        assert_eq!(findings, 3);
        assert!(sink.has_status("flask 0.12 PYSEC-2018-66", StatusLevel::Error));
        assert!(sink.has_status(
            "VULNERABILITY: axios (moderate) in follow-redirects",
            StatusLevel::Error
        ));
        assert!(sink.has_status("Package install scripts", StatusLevel::Warning));
    }
}
