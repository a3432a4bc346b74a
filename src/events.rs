//! # Job Events Module
//!
//! Questo modulo definisce i messaggi scambiati tra client ed engine.
//!
//! ## Responsabilità:
//! - `JobRequest`: richiesta di un job (`session_id` + opzioni)
//! - `JobEvent`: eventi emessi dall'engine verso il client, in ordine
//! - Serializzazione JSON con tag `type`, una riga per evento in modalità JSON
//!
//! ## Tipi di messaggi:
//! - `status`: progresso corrente con livello (`info|success|warning|error`)
//! - `complete`: ottimizzazione completata, nome archivio + report per file
//! - `analysis_complete`: analisi/scan completati
//! - `error`: fallimento del job
//! - `credits_updated`: saldo crediti, sempre dopo l'evento terminale

use crate::optimizer::report::{FileReport, FileTreeNode};
use crate::options::ProcessingOptions;
use crate::progress::StatusLevel;
use serde::{Deserialize, Serialize};

/// A job request as received from the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub session_id: String,
    #[serde(default)]
    pub options: ProcessingOptions,
}

impl JobRequest {
    pub fn new(session_id: impl Into<String>, options: ProcessingOptions) -> Self {
        Self {
            session_id: session_id.into(),
            options,
        }
    }
}

/// Events streamed from the engine to the originating client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// Progress line
    Status { message: String, level: StatusLevel },

    /// Optimization finished; `file_tree` carries the per-file reports
    Complete {
        archive_name: String,
        file_tree: Vec<FileReport>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        output_tree: Vec<FileTreeNode>,
    },

    /// Backend analysis or security scan finished
    AnalysisComplete,

    /// Job failed
    Error { message: String },

    /// Balance after the job, sent after every terminal event
    CreditsUpdated { credits: u32 },
}

impl JobEvent {
    pub fn status(message: impl Into<String>, level: StatusLevel) -> Self {
        Self::Status {
            message: message.into(),
            level,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// True for `complete`, `analysis_complete` and `error`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Complete { .. } | Self::AnalysisComplete | Self::Error { .. }
        )
    }

    /// Emette il messaggio JSON su stdout
    pub fn emit_json(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shapes() {
        let event = JobEvent::status("Optimizing assets...", StatusLevel::Info);
        let status = serde_json::to_value(event).unwrap();
        assert_eq!(
            status,
            json!({"type": "status", "message": "Optimizing assets...", "level": "info"})
        );

        let done = serde_json::to_value(JobEvent::AnalysisComplete).unwrap();
        assert_eq!(done, json!({"type": "analysis_complete"}));

        let credits = serde_json::to_value(JobEvent::CreditsUpdated { credits: 4 }).unwrap();
        assert_eq!(credits, json!({"type": "credits_updated", "credits": 4}));
    }

    #[test]
    fn test_request_options_are_optional() {
        let request: JobRequest = serde_json::from_str(r#"{"session_id": "abc"}"#).unwrap();
        assert_eq!(request.session_id, "abc");
        assert_eq!(request.options, ProcessingOptions::default());

        let request: JobRequest =
            serde_json::from_str(r#"{"session_id": "abc", "options": {"add_csp": true, "x": 1}}"#).unwrap();
        assert!(request.options.add_csp);
    }

    #[test]
    fn test_terminal_classification() {
        assert!(JobEvent::error("boom").is_terminal());
        assert!(JobEvent::AnalysisComplete.is_terminal());
        assert!(!JobEvent::CreditsUpdated { credits: 0 }.is_terminal());
        assert!(!JobEvent::status("x", StatusLevel::Warning).is_terminal());
    }
}
