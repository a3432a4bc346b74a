//! # Scan Engine
//!
//! Audit multi-tool di una workspace, con i risultati trasmessi come eventi di
//! stato man mano che vengono trovati:
//! - `backend`: linter Python (flake8, vulture)
//! - `security`: audit delle dipendenze (pip-audit, npm audit) + scan euristico
//! - `heuristics`: ricerca di segreti hardcoded e flag di debug nei sorgenti

pub mod backend;
pub mod heuristics;
pub mod security;

pub use backend::BackendAnalyzer;
pub use heuristics::{HeuristicKind, SourceScanner};
pub use security::SecurityScanner;

use crate::progress::{ProgressReporter, StatusLevel};

/// One reported issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFinding {
    pub message: String,
    pub level: StatusLevel,
}

impl ScanFinding {
    pub fn high_risk(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: StatusLevel::Error,
        }
    }
}

/// Streams findings and keeps the running count
pub struct FindingLog<'a> {
    reporter: &'a ProgressReporter,
    count: usize,
}

impl<'a> FindingLog<'a> {
    pub fn new(reporter: &'a ProgressReporter) -> Self {
        Self { reporter, count: 0 }
    }

    pub async fn record(&mut self, finding: ScanFinding) {
        self.count += 1;
        self.reporter.status(finding.message, finding.level).await;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn reporter(&self) -> &'a ProgressReporter {
        self.reporter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingSink;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_findings_are_streamed_and_counted() {
        let sink = Arc::new(RecordingSink::default());
        let reporter = ProgressReporter::new(sink.clone());
        let mut log = FindingLog::new(&reporter);

        log.record(ScanFinding::high_risk("first")).await;
        log.record(ScanFinding {
            message: "second".to_string(),
            level: StatusLevel::Warning,
        })
        .await;

        assert_eq!(log.count(), 2);
        assert_eq!(
            sink.statuses(),
            vec![
                ("first".to_string(), StatusLevel::Error),
                ("second".to_string(), StatusLevel::Warning),
            ]
        );
    }
}
