//! # Stylesheet Handler Module
//!
//! Durante la visita i CSS vengono solo copiati: purge e minificazione
//! richiedono l'intero albero di output e girano nel pass successivo.

use crate::error::{EngineError, EngineResult};
use crate::file_manager::FileManager;
use crate::handlers::Outcome;
use crate::optimizer::report::FileStatus;
use std::path::Path;
use tokio::fs;

pub const PENDING_MESSAGE: &str = "Copied, pending final processing.";

/// Stylesheets are copied verbatim; purge and minification run after the walk
pub async fn stage(input: &Path, output: &Path) -> EngineResult<Outcome> {
    FileManager::copy_file(input, output).await?;
    Ok(Outcome::with_status(FileStatus::Info, PENDING_MESSAGE))
}

/// Minify a stylesheet in place, returning its new size
pub async fn minify_in_place(path: &Path) -> EngineResult<u64> {
    let bytes = fs::read(path).await?;
    let source = String::from_utf8(bytes)
        .map_err(|_| EngineError::Format(format!("{} is not valid UTF-8", path.display())))?;
    let minified = minifier::css::minify(&source)
        .map_err(|e| EngineError::Format(format!("CSS minification failed: {e}")))?
        .to_string();
    fs::write(path, minified.as_bytes()).await?;
    Ok(minified.len() as u64)
}
