//! # Path Resolution Module
//!
//! Centralizza il calcolo dei path relativi e del path di output speculare.

use crate::error::{EngineError, EngineResult};
use crate::utils::to_posix;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maps input files to their mirrored output location
pub struct PathResolver;

impl PathResolver {
    /// Path of `input` relative to `input_base_dir`
    pub fn relative_path<'a>(input: &'a Path, input_base_dir: &Path) -> EngineResult<&'a Path> {
        input.strip_prefix(input_base_dir).map_err(|_| {
            EngineError::Format(format!(
                "{} is outside of {}",
                input.display(),
                input_base_dir.display()
            ))
        })
    }

    /// Relative path in posix form, the key used by every report
    pub fn report_key(input: &Path, input_base_dir: &Path) -> EngineResult<String> {
        Self::relative_path(input, input_base_dir).map(to_posix)
    }

    /// Output path mirroring `input`'s relative position under `output_dir`
    pub fn get_output_path(
        input: &Path,
        input_base_dir: &Path,
        output_dir: &Path,
    ) -> EngineResult<PathBuf> {
        let result = output_dir.join(Self::relative_path(input, input_base_dir)?);
        debug!("Resolved output path: {} -> {}", input.display(), result.display());
        Ok(result)
    }

    /// Crea le directory parent se necessario
    pub async fn ensure_parent_dirs(path: &Path) -> EngineResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}
