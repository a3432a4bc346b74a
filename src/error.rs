//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore dell'engine.
//!
//! ## Responsabilità:
//! - Definisce `EngineError` per categorizzare ogni fallimento possibile
//! - Distingue errori dei tool esterni (mancante, timeout, exit code)
//! - Separa gli errori per-file (recuperabili) da quelli che abortiscono il job
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `ToolNotFound`: eseguibile esterno non trovato
//! - `ToolTimeout`: il tool ha superato la sua deadline
//! - `ToolExecutionFailed`: exit code non-zero senza output interpretabile
//! - `Format`: file di input malformato (immagine illeggibile, HTML non UTF-8)
//! - `InsufficientCredits`: account senza crediti
//! - `UnknownAccount`: account non presente nello store
//! - `Workspace`: errori di I/O sul filesystem
//!
//! ## Esempio:
//! ```rust
//! use project_suite::EngineError;
//!
//! let err = EngineError::ToolNotFound("svgo".to_string());
//! assert_eq!(err.to_string(), "Tool not found: svgo");
//! ```

use std::time::Duration;

/// Errors produced by the session processing engine
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("{tool} timed out after {}s", .after.as_secs())]
    ToolTimeout { tool: String, after: Duration },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolExecutionFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("Malformed input: {0}")]
    Format(String),

    #[error("Insufficient credits.")]
    InsufficientCredits,

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Workspace error: {0}")]
    Workspace(#[from] std::io::Error),
}

impl From<image::ImageError> for EngineError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => EngineError::Workspace(io),
            other => EngineError::Format(other.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for EngineError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => EngineError::Workspace(io),
            other => EngineError::Format(other.to_string()),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_mentions_tool_and_seconds() {
        let err = EngineError::ToolTimeout {
            tool: "terser".to_string(),
            after: Duration::from_secs(300),
        };
        assert_eq!(err.to_string(), "terser timed out after 300s");
    }

    #[test]
    fn test_io_errors_become_workspace_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::Workspace(_)));
    }
}
