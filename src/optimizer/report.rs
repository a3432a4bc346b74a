//! # Report Aggregation
//!
//! Pipeline del report in due fasi esplicite:
//! 1. il dispatcher produce uno [`WalkSnapshot`] immutabile (un report per file,
//!    in ordine di visita);
//! 2. il pass CSS produce un [`CssOverlay`] indicizzato per path relativo.
//!
//! [`ReportAggregator::merge`] combina le due fasi senza mutare lo snapshot.
//! Il [`FileTreeNode`] dell'output viene costruito separatamente dal filesystem.

use crate::error::EngineResult;
use crate::file_manager::FileManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Outcome class of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Warning,
    Info,
    Error,
}

/// Per-file result reported back to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub name: String,
    /// Relative to the session root, posix separators
    #[serde(rename = "path")]
    pub relative_path: String,
    pub original_size: u64,
    pub new_size: u64,
    pub status: FileStatus,
    pub message: String,
}

/// Phase 1: reports in walk order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSnapshot {
    reports: Vec<FileReport>,
}

impl WalkSnapshot {
    pub fn new(reports: Vec<FileReport>) -> Self {
        Self { reports }
    }

    pub fn reports(&self) -> &[FileReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn get(&self, relative_path: &str) -> Option<&FileReport> {
        self.reports
            .iter()
            .find(|report| report.relative_path == relative_path)
    }

    /// Relative paths of stylesheets, in walk order
    pub fn stylesheets(&self) -> impl Iterator<Item = &str> {
        self.reports
            .iter()
            .filter(|report| {
                FileManager::lowercase_extension(Path::new(&report.relative_path)).as_deref()
                    == Some("css")
            })
            .map(|report| report.relative_path.as_str())
    }
}

/// Change to one report produced by the CSS pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssPatch {
    pub new_size: u64,
    pub status: FileStatus,
    pub message: String,
}

/// Phase 2: patches keyed by relative path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssOverlay {
    patches: BTreeMap<String, CssPatch>,
}

impl CssOverlay {
    pub fn insert(&mut self, relative_path: impl Into<String>, patch: CssPatch) {
        self.patches.insert(relative_path.into(), patch);
    }

    pub fn get(&self, relative_path: &str) -> Option<&CssPatch> {
        self.patches.get(relative_path)
    }
}

/// Node of the output directory tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileTreeNode>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// Aggregate totals over a report list
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReportSummary {
    pub files_processed: usize,
    pub files_optimized: usize,
    pub files_copied: usize,
    pub errors: usize,
    pub total_original_size: u64,
    pub total_new_size: u64,
}

impl ReportSummary {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.files_processed += 1;
            summary.total_original_size += report.original_size;
            summary.total_new_size += report.new_size;
            match report.status {
                FileStatus::Success => summary.files_optimized += 1,
                FileStatus::Error => summary.errors += 1,
                FileStatus::Warning | FileStatus::Info => summary.files_copied += 1,
            }
        }
        summary
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.total_original_size, self.total_new_size)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Optimized: {} | Copied: {} | Errors: {} | {} -> {} ({:.2}%)",
            self.files_processed,
            self.files_optimized,
            self.files_copied,
            self.errors,
            FileManager::format_size(self.total_original_size),
            FileManager::format_size(self.total_new_size),
            self.overall_reduction_percent()
        )
    }
}

pub struct ReportAggregator;

impl ReportAggregator {
    /// Apply the overlay to the snapshot, keeping walk order
    pub fn merge(snapshot: &WalkSnapshot, overlay: &CssOverlay) -> Vec<FileReport> {
        snapshot
            .reports()
            .iter()
            .map(|report| match overlay.get(&report.relative_path) {
                Some(patch) => FileReport {
                    new_size: patch.new_size,
                    status: patch.status,
                    message: patch.message.clone(),
                    ..report.clone()
                },
                None => report.clone(),
            })
            .collect()
    }

    /// Directory hierarchy of `dir`, entries sorted by name
    pub fn build_file_tree(dir: &Path) -> EngineResult<Vec<FileTreeNode>> {
        let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut nodes = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() {
                nodes.push(FileTreeNode {
                    name,
                    kind: NodeKind::Directory,
                    children: Some(Self::build_file_tree(&entry.path())?),
                });
            } else {
                nodes.push(FileTreeNode {
                    name,
                    kind: NodeKind::File,
                    children: None,
                });
            }
        }
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn report(path: &str, status: FileStatus, message: &str) -> FileReport {
        FileReport {
            name: path.rsplit('/').next().unwrap().to_string(),
            relative_path: path.to_string(),
            original_size: 100,
            new_size: 100,
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_merge_applies_overlay_in_walk_order() {
        let snapshot = WalkSnapshot::new(vec![
            report("a.css", FileStatus::Info, "Copied, pending final processing."),
            report("b.html", FileStatus::Success, "Minified"),
            report("css/c.css", FileStatus::Info, "Copied, pending final processing."),
        ]);
        let mut overlay = CssOverlay::default();
        overlay.insert(
            "css/c.css",
            CssPatch {
                new_size: 40,
                status: FileStatus::Success,
                message: "Minified".to_string(),
            },
        );

        let merged = ReportAggregator::merge(&snapshot, &overlay);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0], snapshot.reports()[0]);
        assert_eq!(merged[2].new_size, 40);
        assert_eq!(merged[2].status, FileStatus::Success);
        assert_eq!(merged[2].original_size, 100);
        // the snapshot itself is untouched
        assert_eq!(snapshot.get("css/c.css").unwrap().status, FileStatus::Info);
        assert_eq!(snapshot.stylesheets().collect::<Vec<_>>(), vec!["a.css", "css/c.css"]);
    }

    #[test]
    fn test_report_json_shape() {
        let json =
            serde_json::to_value(report("img/logo.png", FileStatus::Success, "Optimized")).unwrap();
        assert_eq!(json["path"], "img/logo.png");
        assert_eq!(json["status"], "success");
        assert!(json.get("relative_path").is_none());
    }

    #[test]
    fn test_file_tree_is_sorted_and_nested() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("js")).unwrap();
        std::fs::write(temp_dir.path().join("js/app.js"), "").unwrap();
        std::fs::write(temp_dir.path().join("index.html"), "").unwrap();
        std::fs::write(temp_dir.path().join("about.html"), "").unwrap();

        let tree = ReportAggregator::build_file_tree(temp_dir.path()).unwrap();
        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["about.html", "index.html", "js"]);
        assert_eq!(tree[2].kind, NodeKind::Directory);
        assert_eq!(tree[2].children.as_ref().unwrap()[0].name, "app.js");
        assert!(tree[0].children.is_none());

        let json = serde_json::to_value(&tree[2]).unwrap();
        assert_eq!(json["type"], "directory");
        assert!(serde_json::to_value(&tree[0]).unwrap().get("children").is_none());
    }

    #[test]
    fn test_summary_counts() {
        let mut reports = vec![
            report("a.png", FileStatus::Success, "Optimized"),
            report("b.txt", FileStatus::Warning, "Copied as-is."),
            report("c.svg", FileStatus::Error, "svgo timed out after 120s"),
        ];
        reports[0].new_size = 50;

        let summary = ReportSummary::from_reports(&reports);
        assert_eq!(summary.files_processed, 3);
        assert_eq!(summary.files_optimized, 1);
        assert_eq!(summary.files_copied, 1);
        assert_eq!(summary.errors, 1);
        assert!((summary.overall_reduction_percent() - 50.0 / 3.0).abs() < 1e-9);
    }
}
