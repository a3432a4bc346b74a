//! # Session Workspace
//!
//! Coppia di directory `<unpacked_root>/<session_id>` e
//! `<processed_root>/<session_id>` legata a un singolo job.
//!
//! La rimozione avviene sempre: esplicitamente a fine job con [`SessionWorkspace::cleanup`],
//! oppure nel `Drop` se il job termina senza arrivarci (panic, task abortito).
//! L'archivio finale vive fuori dalla directory di sessione e sopravvive al cleanup.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reject ids that could escape the workspace roots
pub fn validate_session_id(session_id: &str) -> EngineResult<()> {
    let valid = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(EngineError::Format(format!("Invalid session id '{}'", session_id)))
    }
}

#[derive(Debug)]
pub struct SessionWorkspace {
    session_id: String,
    input_dir: PathBuf,
    output_dir: PathBuf,
    archive_path: PathBuf,
    cleaned: bool,
}

impl SessionWorkspace {
    pub fn new(config: &EngineConfig, session_id: &str) -> EngineResult<Self> {
        validate_session_id(session_id)?;
        Ok(Self {
            session_id: session_id.to_string(),
            input_dir: config.unpacked_root.join(session_id),
            output_dir: config.processed_root.join(session_id),
            archive_path: config
                .processed_root
                .join(Self::archive_file_name(session_id)),
            cleaned: false,
        })
    }

    pub fn archive_file_name(session_id: &str) -> String {
        format!("optimized_{}.zip", session_id)
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn archive_name(&self) -> String {
        Self::archive_file_name(&self.session_id)
    }

    /// Remove both session directories; missing ones are fine
    pub async fn cleanup(&mut self) {
        for dir in [&self.input_dir, &self.output_dir] {
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => debug!("Removed {}", dir.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to clean up {}: {}", dir.display(), e),
            }
        }
        self.cleaned = true;
    }
}

impl Drop for SessionWorkspace {
    fn drop(&mut self) {
        if self.cleaned {
            return;
        }
        for dir in [&self.input_dir, &self.output_dir] {
            if let Err(e) = std::fs::remove_dir_all(dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to clean up {} on drop: {}", dir.display(), e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_session_id_validation() {
        assert!(validate_session_id("a1b2-c3_d4").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("../etc").is_err());
        assert!(validate_session_id("a/b").is_err());
    }

    #[tokio::test]
    async fn test_cleanup_removes_both_dirs_and_keeps_archive() {
        let base = TempDir::new().unwrap();
        let config = EngineConfig::rooted_at(base.path());
        let mut workspace = SessionWorkspace::new(&config, "s1").unwrap();

        std::fs::create_dir_all(workspace.input_dir().join("nested")).unwrap();
        std::fs::create_dir_all(workspace.output_dir()).unwrap();
        std::fs::write(workspace.archive_path(), "zip").unwrap();

        workspace.cleanup().await;
        assert!(!workspace.input_dir().exists());
        assert!(!workspace.output_dir().exists());
        assert!(workspace.archive_path().exists());
        assert_eq!(workspace.archive_name(), "optimized_s1.zip");
    }

    #[test]
    fn test_drop_cleans_up() {
        let base = TempDir::new().unwrap();
        let config = EngineConfig::rooted_at(base.path());
        let input = {
            let workspace = SessionWorkspace::new(&config, "s2").unwrap();
            std::fs::create_dir_all(workspace.input_dir()).unwrap();
            workspace.input_dir().to_path_buf()
        };
        assert!(!input.exists());
    }
}
