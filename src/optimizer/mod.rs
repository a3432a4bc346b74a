//! # Optimizer Module
//!
//! Ottimizzazione frontend di una sessione, separata in sottomoduli:
//! - `dispatcher`: visita dell'albero e trasformazione per file (fase 1)
//! - `cross_pass`: purge + minify CSS e critical CSS (fase 2)
//! - `report`: snapshot, overlay, merge e albero di output
//! - `path_resolver`: logica di calcolo path centralizzata

pub mod cross_pass;
pub mod dispatcher;
pub mod path_resolver;
pub mod report;

pub use cross_pass::CrossPassCoordinator;
pub use dispatcher::Dispatcher;
pub use path_resolver::PathResolver;
pub use report::{FileReport, FileStatus, FileTreeNode, ReportAggregator, ReportSummary};

use crate::account::PlanTier;
use crate::error::{EngineError, EngineResult};
use crate::file_manager::FileManager;
use crate::handlers::TransformContext;
use crate::options::ProcessingOptions;
use crate::progress::ProgressReporter;
use crate::runner::ToolRunner;
use std::path::Path;
use tracing::info;

/// Result of a frontend optimization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationReport {
    /// One report per input file, in walk order
    pub files: Vec<FileReport>,
    pub output_tree: Vec<FileTreeNode>,
}

pub struct FrontendOptimizer<'a> {
    runner: &'a ToolRunner,
    options: &'a ProcessingOptions,
    plan: PlanTier,
    reporter: &'a ProgressReporter,
}

impl<'a> FrontendOptimizer<'a> {
    pub fn new(
        runner: &'a ToolRunner,
        options: &'a ProcessingOptions,
        plan: PlanTier,
        reporter: &'a ProgressReporter,
    ) -> Self {
        Self {
            runner,
            options,
            plan,
            reporter,
        }
    }

    pub async fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> EngineResult<OptimizationReport> {
        if FileManager::is_non_empty_dir(output_dir).await? {
            return Err(EngineError::Workspace(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("output directory {} is not empty", output_dir.display()),
            )));
        }
        tokio::fs::create_dir_all(output_dir).await?;

        self.reporter.info("Optimizing assets...").await;
        let ctx = TransformContext {
            runner: self.runner,
            options: self.options,
        };
        let snapshot = Dispatcher::new(ctx, self.reporter)
            .walk(input_dir, output_dir)
            .await?;

        let coordinator = CrossPassCoordinator::new(self.runner, self.reporter);
        let overlay = coordinator
            .run(output_dir, &snapshot, self.options.purge_css)
            .await;
        let files = ReportAggregator::merge(&snapshot, &overlay);
        self.reporter
            .success("File processing complete.")
            .await;

        if self.options.generate_critical_css && self.plan.includes_critical_css() {
            coordinator.critical(output_dir).await;
        }

        info!("{}", ReportSummary::from_reports(&files).format_summary());

        Ok(OptimizationReport {
            files,
            output_tree: ReportAggregator::build_file_tree(output_dir)?,
        })
    }
}
