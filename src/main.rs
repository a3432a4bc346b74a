//! # Project Suite - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr)
//! - Caricamento della configurazione e override da CLI
//! - Avvio del job e rendering degli eventi (spinner o JSON una riga per evento)
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI
//! 2. Configura il logging (`RUST_LOG`, oppure INFO/DEBUG a seconda di `--verbose`)
//! 3. Carica la configurazione e crea le directory radice
//! 4. Opzionalmente copia `--input` nella workspace della sessione
//! 5. Avvia il job sull'engine e consuma gli eventi fino a `credits_updated`
//!
//! ## Esempio di utilizzo:
//! ```bash
//! project-suite optimize --session demo --input ./site --options '{"purge_css": true}'
//! project-suite --json scan --session demo --input ./api --plan premium
//! project-suite tools
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use project_suite::file_manager::FileManager;
use project_suite::session::validate_session_id;
use project_suite::{
    ChannelSink, ConsoleProgress, Engine, EngineConfig, InMemoryAccountStore, JobContext, JobEvent,
    JobKind, JobRequest, PlanTier, ProcessingOptions, ToolPathResolver,
};

const CLI_ACCOUNT: &str = "cli";

#[derive(Parser)]
#[command(name = "project-suite")]
#[command(about = "Optimize frontend assets, lint Python backends and scan projects for secrets")]
struct Cli {
    /// Configuration file (JSON); missing file means defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory with bundled tools, searched before PATH
    #[arg(long, global = true)]
    tools_dir: Option<PathBuf>,

    /// Print one JSON event per line instead of the progress display
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Frontend asset optimization, producing a result archive
    Optimize(JobArgs),
    /// Backend static analysis (Python linters)
    Analyze(JobArgs),
    /// Dependency audit and secret/debug-flag scan
    Scan(JobArgs),
    /// Report which external tools are available
    Tools,
}

#[derive(Args)]
struct JobArgs {
    /// Session identifier
    #[arg(short, long)]
    session: String,

    /// Processing options as a JSON object
    #[arg(short, long, default_value = "{}")]
    options: String,

    /// Project directory copied into the session workspace before the job runs
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Credits available to the job's account
    #[arg(long, default_value = "1")]
    credits: u32,

    /// Plan tier of the job's account (free, premium, pro)
    #[arg(long, default_value = "free")]
    plan: PlanTier,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match cli.config {
        Some(ref path) => EngineConfig::from_file(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if cli.tools_dir.is_some() {
        config.tools_dir = cli.tools_dir.clone();
    }
    config.json_output |= cli.json;
    config.validate()?;

    let (kind, args) = match cli.command {
        Command::Tools => {
            let resolver =
                ToolPathResolver::new(config.tools_dir.as_deref(), config.use_system_path);
            println!("{}", resolver.get_tools_report());
            return Ok(());
        }
        Command::Optimize(args) => (JobKind::FrontendOptimization, args),
        Command::Analyze(args) => (JobKind::BackendAnalysis, args),
        Command::Scan(args) => (JobKind::SecurityScan, args),
    };

    config.ensure_directories().await?;
    validate_session_id(&args.session)?;
    let options = ProcessingOptions::from_json_str(&args.options)
        .with_context(|| format!("Invalid --options JSON: {}", args.options))?;

    if let Some(ref input) = args.input {
        if !input.is_dir() {
            return Err(anyhow::anyhow!("Input directory does not exist: {}", input.display()));
        }
        let workspace = config.unpacked_root.join(&args.session);
        let copied = FileManager::copy_tree(input, &workspace).await?;
        info!("Staged {} files into {}", copied, workspace.display());
    }

    let json_output = config.json_output;
    let accounts = Arc::new(InMemoryAccountStore::with_account(
        CLI_ACCOUNT,
        args.credits,
        args.plan,
    ));
    let engine = Arc::new(Engine::new(config, accounts));

    let (sink, mut events) = ChannelSink::new();
    let job = engine.spawn_job(
        kind,
        JobRequest::new(args.session.clone(), options),
        JobContext::new(CLI_ACCOUNT, Arc::new(sink)),
    );

    let console =
        (!json_output).then(|| ConsoleProgress::new(&format!("Running {}...", kind.label())));
    let mut failure = None;

    while let Some(event) = events.recv().await {
        if let JobEvent::Error { ref message } = event {
            failure = Some(message.clone());
        }
        match console {
            Some(ref console) => console.render(&event),
            None => event.emit_json(),
        }
    }
    job.await?;

    if let Some(ref console) = console {
        console.finish(if failure.is_some() { "Failed" } else { "Done" });
    }

    match failure {
        Some(message) => Err(anyhow::anyhow!("{} failed: {}", kind.label(), message)),
        None => Ok(()),
    }
}
