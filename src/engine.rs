//! # Session Processing Engine
//!
//! Punto di ingresso di ogni job. Il flusso è sempre lo stesso:
//! 1. addebito atomico di un credito (rifiuto immediato se il saldo è < 1,
//!    prima di qualunque I/O sulla workspace)
//! 2. esecuzione del job (ottimizzazione, analisi backend o scan di sicurezza)
//! 3. esattamente un evento terminale (`complete`, `analysis_complete` o `error`)
//! 4. cleanup della workspace di sessione, su ogni percorso
//! 5. `credits_updated` con il saldo corrente
//!
//! L'addebito avviene prima del tentativo e non viene rimborsato in caso di
//! fallimento.
//!
//! Ogni job riceve un [`JobContext`] esplicito (sink del client e account):
//! l'engine non ha stato globale mutabile.

use crate::account::{AccountStore, PlanTier};
use crate::archive;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::events::{JobEvent, JobRequest};
use crate::optimizer::FrontendOptimizer;
use crate::progress::{EventSink, ProgressReporter};
use crate::runner::ToolRunner;
use crate::scan::{BackendAnalyzer, SecurityScanner};
use crate::session::SessionWorkspace;
use crate::tool_resolver::ToolPathResolver;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Cost of every job, in credits
pub const JOB_COST: u32 = 1;

/// The pipelines a client can run over a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    FrontendOptimization,
    BackendAnalysis,
    SecurityScan,
}

impl JobKind {
    pub fn label(&self) -> &'static str {
        match self {
            JobKind::FrontendOptimization => "frontend optimization",
            JobKind::BackendAnalysis => "backend analysis",
            JobKind::SecurityScan => "security scan",
        }
    }
}

/// Who submitted the job and where its events go
#[derive(Clone)]
pub struct JobContext {
    pub account_id: String,
    pub sink: Arc<dyn EventSink>,
}

impl JobContext {
    pub fn new(account_id: impl Into<String>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            account_id: account_id.into(),
            sink,
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    runner: ToolRunner,
    accounts: Arc<dyn AccountStore>,
}

impl Engine {
    pub fn new(config: EngineConfig, accounts: Arc<dyn AccountStore>) -> Self {
        let resolver = ToolPathResolver::new(config.tools_dir.as_deref(), config.use_system_path);
        let runner = ToolRunner::new(resolver, config.timeouts.clone());
        Self::with_runner(config, runner, accounts)
    }

    pub fn with_runner(
        config: EngineConfig,
        runner: ToolRunner,
        accounts: Arc<dyn AccountStore>,
    ) -> Self {
        Self {
            config,
            runner,
            accounts,
        }
    }

    /// Run a job on its own task
    pub fn spawn_job(
        self: &Arc<Self>,
        kind: JobKind,
        request: JobRequest,
        ctx: JobContext,
    ) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run_job(kind, request, ctx).await })
    }

    /// Run one job to completion, streaming every event to `ctx.sink`
    pub async fn run_job(&self, kind: JobKind, request: JobRequest, ctx: JobContext) {
        let reporter = ProgressReporter::new(Arc::clone(&ctx.sink));

        let balance = match self.accounts.try_debit(&ctx.account_id, JOB_COST) {
            Ok(balance) => balance,
            Err(e) => {
                warn!("Rejected {} for {}: {}", kind.label(), ctx.account_id, e);
                reporter.send(JobEvent::error(e.to_string()));
                let credits = self.accounts.credits(&ctx.account_id).unwrap_or(0);
                reporter.send(JobEvent::CreditsUpdated { credits });
                return;
            }
        };
        let plan = self.accounts.plan(&ctx.account_id).unwrap_or_default();
        info!(
            "Starting {} for session {} (plan {}, {} credits left)",
            kind.label(),
            request.session_id,
            plan,
            balance
        );

        let mut workspace = None;
        let outcome = match SessionWorkspace::new(&self.config, &request.session_id) {
            Ok(created) => {
                let created = workspace.insert(created);
                self.execute(kind, &request, plan, created, &reporter).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(terminal) => reporter.send(terminal),
            Err(e) => {
                error!("{} failed for session {}: {}", kind.label(), request.session_id, e);
                reporter
                    .error(format!("A critical error occurred: {}", e))
                    .await;
                reporter.send(JobEvent::error(e.to_string()));
            }
        }

        if let Some(mut workspace) = workspace {
            workspace.cleanup().await;
        }

        let credits = self.accounts.credits(&ctx.account_id).unwrap_or(balance);
        reporter.send(JobEvent::CreditsUpdated { credits });
    }

    async fn execute(
        &self,
        kind: JobKind,
        request: &JobRequest,
        plan: PlanTier,
        workspace: &SessionWorkspace,
        reporter: &ProgressReporter,
    ) -> EngineResult<JobEvent> {
        ensure_input_dir(workspace.input_dir())?;

        match kind {
            JobKind::FrontendOptimization => {
                let report = FrontendOptimizer::new(&self.runner, &request.options, plan, reporter)
                    .run(workspace.input_dir(), workspace.output_dir())
                    .await?;

                reporter.info("Finalizing and creating ZIP archive...").await;
                archive::package_directory(workspace.output_dir(), workspace.archive_path()).await?;
                reporter.success("Archive created successfully.").await;

                Ok(JobEvent::Complete {
                    archive_name: workspace.archive_name(),
                    file_tree: report.files,
                    output_tree: report.output_tree,
                })
            }
            JobKind::BackendAnalysis => {
                BackendAnalyzer::new(&self.runner, reporter)
                    .run(workspace.input_dir())
                    .await?;
                Ok(JobEvent::AnalysisComplete)
            }
            JobKind::SecurityScan => {
                SecurityScanner::new(&self.runner, reporter, &self.config.cache_dir, plan)
                    .run(workspace.input_dir())
                    .await?;
                Ok(JobEvent::AnalysisComplete)
            }
        }
    }
}

fn ensure_input_dir(dir: &Path) -> EngineResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(EngineError::Workspace(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("session workspace {} does not exist", dir.display()),
        )))
    }
}
