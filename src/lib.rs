//! # Project Suite Engine Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'engine di sessione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per il layer di trasporto
//!
//! ## Architettura dei moduli:
//! - `engine`: job runner (crediti, workspace, evento terminale, cleanup)
//! - `optimizer`: dispatcher, pass CSS e aggregazione report
//! - `handlers`: trasformazioni per tipo di file
//! - `scan`: analisi backend e scan di sicurezza
//! - `runner` / `tool_resolver`: invocazione dei tool esterni
//! - `progress` / `events`: streaming ordinato degli eventi verso il client
//! - `account`, `session`, `archive`, `config`, `options`, `error`
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use project_suite::{
//!     ChannelSink, Engine, EngineConfig, InMemoryAccountStore, JobContext, JobKind, JobRequest,
//!     PlanTier, ProcessingOptions,
//! };
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let accounts = Arc::new(InMemoryAccountStore::with_account("alice", 3, PlanTier::Pro));
//! let engine = Arc::new(Engine::new(EngineConfig::default(), accounts));
//! let (sink, mut events) = ChannelSink::new();
//!
//! engine.spawn_job(
//!     JobKind::FrontendOptimization,
//!     JobRequest::new("session-1", ProcessingOptions::default()),
//!     JobContext::new("alice", Arc::new(sink)),
//! );
//! while let Some(event) = events.recv().await {
//!     event.emit_json();
//! }
//! # }
//! ```

pub mod account;
pub mod archive;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod file_manager;
pub mod handlers;
pub mod optimizer;
pub mod options;
pub mod progress;
pub mod runner;
pub mod scan;
pub mod session;
pub mod tool_resolver;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use account::{AccountStore, InMemoryAccountStore, PlanTier};
pub use config::{EngineConfig, ToolTimeouts};
pub use engine::{Engine, JobContext, JobKind};
pub use error::{EngineError, EngineResult};
pub use events::{JobEvent, JobRequest};
pub use optimizer::{FileReport, FileStatus, FileTreeNode};
pub use options::{ObfuscationLevel, ProcessingOptions};
pub use progress::{ChannelSink, ConsoleProgress, EventSink, ProgressReporter, StatusLevel};
pub use runner::{ToolInvocation, ToolInvocationResult, ToolRunner};
pub use tool_resolver::ToolPathResolver;
