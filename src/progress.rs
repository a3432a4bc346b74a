//! # Progress Reporting Module
//!
//! Questo modulo gestisce lo streaming ordinato degli eventi verso il client.
//!
//! ## Responsabilità:
//! - `EventSink`: il seam verso il trasporto ("emit(event, to=client)")
//! - `ProgressReporter`: emette gli eventi di stato di un job, nell'ordine esatto
//!   in cui vengono prodotti, cedendo brevemente il controllo dopo ognuno
//! - `ChannelSink`: sink basato su canale tokio per il trasporto reale
//! - `ConsoleProgress`: spinner `indicatif` per l'output a terminale
//!
//! ## Garanzie:
//! - Nessun riordino o coalescenza degli eventi di uno stesso job
//! - Nessuna garanzia di ordine tra job diversi

use crate::events::JobEvent;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Severity of a status event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transport seam: delivers one event to the client that owns the job
pub trait EventSink: Send + Sync {
    fn emit(&self, event: JobEvent);
}

/// Sink backed by an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<JobEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: JobEvent) {
        // A dropped receiver means the client went away; the job keeps running.
        if self.sender.send(event).is_err() {
            tracing::debug!("Event dropped, client receiver closed");
        }
    }
}

/// Ordered status stream for one job
#[derive(Clone)]
pub struct ProgressReporter {
    sink: Arc<dyn EventSink>,
}

impl ProgressReporter {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Emit a status line, then yield so the transport can flush it
    pub async fn status(&self, message: impl Into<String>, level: StatusLevel) {
        let message = message.into();
        tracing::debug!("[{:?}] {}", level, message);
        self.sink.emit(JobEvent::status(message, level));
        tokio::task::yield_now().await;
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.status(message, StatusLevel::Info).await;
    }

    pub async fn success(&self, message: impl Into<String>) {
        self.status(message, StatusLevel::Success).await;
    }

    pub async fn warning(&self, message: impl Into<String>) {
        self.status(message, StatusLevel::Warning).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.status(message, StatusLevel::Error).await;
    }

    /// Emit a non-status event (terminal or credits)
    pub fn send(&self, event: JobEvent) {
        self.sink.emit(event);
    }
}

/// Terminal rendering of a job's event stream
#[derive(Clone)]
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    /// Create a spinner for indeterminate progress
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();

        let template = "{spinner:.green} [{elapsed_precise}] {msg}";
        if let Ok(style) = ProgressStyle::default_spinner().template(template) {
            bar.set_style(style);
        }

        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Print one event above the spinner
    pub fn render(&self, event: &JobEvent) {
        match event {
            JobEvent::Status { message, level } => {
                let marker = match level {
                    StatusLevel::Info => "[INFO]",
                    StatusLevel::Success => "[OK]",
                    StatusLevel::Warning => "[WARN]",
                    StatusLevel::Error => "[ERROR]",
                };
                self.bar.println(format!("{} {}", marker, message));
                self.bar.set_message(message.clone());
            }
            JobEvent::Complete {
                archive_name,
                file_tree,
                ..
            } => {
                for report in file_tree {
                    self.bar.println(format!(
                        "  {:<40} {:>10} -> {:<10} {}",
                        report.relative_path,
                        crate::file_manager::FileManager::format_size(report.original_size),
                        crate::file_manager::FileManager::format_size(report.new_size),
                        report.message
                    ));
                }
                self.bar.println(format!("Archive: {}", archive_name));
            }
            JobEvent::AnalysisComplete => self.bar.println("Analysis complete."),
            JobEvent::Error { message } => self.bar.println(format!("Job failed: {}", message)),
            JobEvent::CreditsUpdated { credits } => {
                self.bar.println(format!("Credits remaining: {}", credits))
            }
        }
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
