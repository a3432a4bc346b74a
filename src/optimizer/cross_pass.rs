//! # Cross-cutting CSS Pass
//!
//! Gira solo dopo che ogni file ha il suo corrispondente in output:
//! 1. **Purge** (opzionale): `purgecss` vede tutti gli HTML/JS processati e i CSS
//!    ancora nella forma copiata, mai minificata
//! 2. **Minify**: ogni CSS di output viene minificato in place, sempre dopo il purge
//! 3. **Critical CSS** (piano `pro`): inline del CSS critico in ogni HTML
//!
//! Nessuno di questi passi è fatale per il job.

use crate::error::EngineError;
use crate::file_manager::FileManager;
use crate::handlers::stylesheet;
use crate::optimizer::report::{CssOverlay, CssPatch, FileStatus, WalkSnapshot};
use crate::progress::ProgressReporter;
use crate::runner::{ToolInvocation, ToolRunner};
use crate::utils::to_posix;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Class kept by purge even when no content file references it
pub const PURGE_SAFELIST: &str = "drag-over";

pub struct CrossPassCoordinator<'a> {
    runner: &'a ToolRunner,
    reporter: &'a ProgressReporter,
}

impl<'a> CrossPassCoordinator<'a> {
    pub fn new(runner: &'a ToolRunner, reporter: &'a ProgressReporter) -> Self {
        Self { runner, reporter }
    }

    /// Purge (when requested) then minify; returns the stylesheet overlay
    pub async fn run(
        &self,
        output_dir: &Path,
        snapshot: &WalkSnapshot,
        purge_requested: bool,
    ) -> CssOverlay {
        if purge_requested {
            self.reporter.info("Purging unused CSS...").await;
            if !self.purge(output_dir).await {
                info!("Stylesheets in {} minified without purge", output_dir.display());
            }
        }

        self.reporter.info("Minifying all CSS...").await;
        self.minify(output_dir, snapshot, purge_requested).await
    }

    /// Run purgecss over the output tree, once per stylesheet directory.
    /// Returns false when purge was skipped or failed.
    pub async fn purge(&self, output_dir: &Path) -> bool {
        let listed = FileManager::find_files_with_extensions(output_dir, &["css"]).and_then(|css| {
            FileManager::find_files_with_extensions(output_dir, &["html", "js"])
                .map(|content| (css, content))
        });
        let (css_files, content_files) = match listed {
            Ok(files) => files,
            Err(e) => {
                warn!("Cannot list files for purge in {}: {}", output_dir.display(), e);
                self.reporter
                    .warning(format!("PurgeCSS skipped: {}. Stylesheets left as copied.", e))
                    .await;
                return false;
            }
        };

        if css_files.is_empty() || content_files.is_empty() {
            debug!(
                "Skipping purge: {} stylesheets, {} content files",
                css_files.len(),
                content_files.len()
            );
            return false;
        }

        // purgecss writes every result into one --output directory by file name
        let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        for css in css_files {
            let dir = css.parent().unwrap_or(output_dir).to_path_buf();
            groups.entry(dir).or_default().push(css);
        }

        let mut all_ok = true;
        for (dir, group) in &groups {
            let invocation = ToolInvocation::new("purgecss", output_dir)
                .arg("--css")
                .args(group)
                .arg("--content")
                .args(&content_files)
                .arg("--output")
                .arg(dir)
                .arg("--safelist")
                .arg(PURGE_SAFELIST)
                .timeout(self.runner.timeouts().purge());

            match self.runner.run(invocation).await {
                Ok(_) => info!("Purged {} stylesheet(s) in {}", group.len(), dir.display()),
                Err(e) => {
                    all_ok = false;
                    warn!("purgecss failed in {}: {}", dir.display(), e);
                    let message = match e {
                        EngineError::ToolTimeout { .. } => {
                            "PurgeCSS timed out. Stylesheets left as copied.".to_string()
                        }
                        other => format!("PurgeCSS failed: {}. Stylesheets left as copied.", other),
                    };
                    self.reporter.warning(message).await;
                }
            }
        }

        all_ok
    }

    /// Minify every stylesheet of the snapshot in place
    pub async fn minify(
        &self,
        output_dir: &Path,
        snapshot: &WalkSnapshot,
        purge_requested: bool,
    ) -> CssOverlay {
        let message = if purge_requested {
            "Purged & Minified"
        } else {
            "Minified"
        };

        let mut overlay = CssOverlay::default();
        for relative_path in snapshot.stylesheets() {
            let path = output_dir.join(relative_path);
            let patch = match stylesheet::minify_in_place(&path).await {
                Ok(new_size) => CssPatch {
                    new_size,
                    status: FileStatus::Success,
                    message: message.to_string(),
                },
                Err(e) => {
                    warn!("Failed to minify {}: {}", relative_path, e);
                    CssPatch {
                        new_size: FileManager::file_size(&path).await.unwrap_or_default(),
                        status: FileStatus::Error,
                        message: e.to_string(),
                    }
                }
            };
            overlay.insert(relative_path, patch);
        }
        overlay
    }

    /// Inline critical CSS into every output HTML file; failures are only reported
    pub async fn critical(&self, output_dir: &Path) {
        let html_files = match FileManager::find_files_with_extensions(output_dir, &["html"]) {
            Ok(files) if files.is_empty() => return,
            Ok(files) => files,
            Err(e) => {
                warn!("Cannot list HTML files in {}: {}", output_dir.display(), e);
                self.reporter
                    .error(format!("Critical CSS generation failed: {}", e))
                    .await;
                return;
            }
        };

        self.reporter
            .info("Generating Critical CSS (Pro feature)...")
            .await;

        let mut failures = 0usize;
        for html in &html_files {
            let relative = html
                .strip_prefix(output_dir)
                .map(to_posix)
                .unwrap_or_else(|_| html.display().to_string());

            let invocation = ToolInvocation::new("critical", output_dir)
                .arg(html)
                .arg("--inline")
                .arg("--base")
                .arg(output_dir)
                .args(["-w", "1200", "-h", "900", "--extract"])
                .timeout(self.runner.timeouts().critical());

            match self.runner.run(invocation).await {
                Ok(_) => debug!("Critical CSS inlined into {}", relative),
                Err(EngineError::ToolTimeout { .. }) => {
                    failures += 1;
                    self.reporter
                        .error(format!("Critical CSS generation timed out for '{}'.", relative))
                        .await;
                }
                Err(e) => {
                    failures += 1;
                    self.reporter
                        .error(format!("Critical CSS generation failed for '{}': {}", relative, e))
                        .await;
                }
            }
        }

        if failures == 0 {
            self.reporter.success("Critical CSS has been inlined.").await;
        }
    }
}
