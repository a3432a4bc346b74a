//! # Workspace Dispatcher
//!
//! Visita ricorsivamente l'albero di input in ordine lessicografico per livello,
//! replica la struttura nella directory di output e instrada ogni file al suo
//! handler.
//!
//! ## Isolamento per file:
//! - un errore dell'handler produce `status = error`, il testo dell'errore come
//!   messaggio e `new_size = original_size`
//! - se l'handler non ha scritto l'output, il file viene copiato così com'è
//! - un errore non interrompe mai la visita

use crate::error::EngineResult;
use crate::file_manager::FileManager;
use crate::handlers::{self, HandlerKind, Outcome, TransformContext};
use crate::optimizer::path_resolver::PathResolver;
use crate::optimizer::report::{FileReport, FileStatus, WalkSnapshot};
use crate::progress::ProgressReporter;
use std::path::Path;
use tracing::{debug, error, warn};

pub struct Dispatcher<'a> {
    ctx: TransformContext<'a>,
    reporter: &'a ProgressReporter,
}

impl<'a> Dispatcher<'a> {
    pub fn new(ctx: TransformContext<'a>, reporter: &'a ProgressReporter) -> Self {
        Self { ctx, reporter }
    }

    /// Process every regular file under `input_dir` into `output_dir`
    pub async fn walk(&self, input_dir: &Path, output_dir: &Path) -> EngineResult<WalkSnapshot> {
        let files = FileManager::find_files(input_dir)?;
        debug!("Dispatching {} files from {}", files.len(), input_dir.display());

        let mut reports = Vec::with_capacity(files.len());
        for input in &files {
            reports.push(self.process_file(input, input_dir, output_dir).await?);
        }

        Ok(WalkSnapshot::new(reports))
    }

    async fn process_file(
        &self,
        input: &Path,
        input_dir: &Path,
        output_dir: &Path,
    ) -> EngineResult<FileReport> {
        let relative_path = PathResolver::report_key(input, input_dir)?;
        let output = PathResolver::get_output_path(input, input_dir, output_dir)?;
        let original_size = FileManager::file_size(input).await?;
        let kind = HandlerKind::for_path(input);

        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| relative_path.clone());

        let result = match PathResolver::ensure_parent_dirs(&output).await {
            Ok(()) => handlers::transform(kind, &self.ctx, input, &output).await,
            Err(e) => Err(e),
        };

        let (outcome, new_size) = match result {
            Ok(outcome) => match FileManager::file_size(&output).await {
                Ok(size) => (outcome, size),
                Err(e) => (
                    Outcome::with_status(FileStatus::Error, format!("Output missing: {e}")),
                    original_size,
                ),
            },
            Err(e) => {
                warn!("{} handler failed for {}: {}", kind.label(), relative_path, e);
                self.reporter
                    .warning(format!("Failed to process '{}': {}", relative_path, e))
                    .await;
                (Outcome::with_status(FileStatus::Error, e.to_string()), original_size)
            }
        };

        if outcome.status == FileStatus::Error && !output.exists() {
            if let Err(e) = FileManager::copy_file(input, &output).await {
                error!("Copy fallback failed for {}: {}", relative_path, e);
            }
        }

        debug!("{} [{}] {:?}: {}", relative_path, kind.label(), outcome.status, outcome.message);

        Ok(FileReport {
            name,
            relative_path,
            original_size,
            new_size,
            status: outcome.status,
            message: outcome.message,
        })
    }
}
