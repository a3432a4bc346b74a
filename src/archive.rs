//! # Archive Module
//!
//! Impacchetta la directory processata di una sessione in `optimized_<id>.zip`.
//! I nomi delle entry sono path relativi con separatore `/`. La scrittura gira su
//! un thread bloccante; un archivio incompleto viene rimosso.

use crate::error::{EngineError, EngineResult};
use crate::utils::to_posix;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip the contents of `source_dir` into `destination`; entry names are relative
/// posix paths. Returns the number of files written.
pub async fn package_directory(source_dir: &Path, destination: &Path) -> EngineResult<usize> {
    let (source_dir, destination): (PathBuf, PathBuf) =
        (source_dir.to_path_buf(), destination.to_path_buf());

    let target = destination.clone();
    let result = tokio::task::spawn_blocking(move || write_archive(&source_dir, &destination))
        .await
        .map_err(|e| EngineError::Workspace(io::Error::new(io::ErrorKind::Other, e)))
        .and_then(|written| written);

    if result.is_err() {
        match tokio::fs::remove_file(&target).await {
            Ok(()) => debug!("Removed incomplete archive {}", target.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove incomplete archive {}: {}", target.display(), e),
        }
    }
    result
}

fn write_archive(source_dir: &Path, destination: &Path) -> EngineResult<usize> {
    let mut zip = ZipWriter::new(BufWriter::new(File::create(destination)?));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut files = 0;

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map(to_posix)
            .map_err(|e| EngineError::Format(e.to_string()))?;

        if entry.file_type().is_dir() {
            zip.add_directory(relative, options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(relative, options)?;
            io::copy(&mut File::open(entry.path())?, &mut zip)?;
            files += 1;
        }
    }

    zip.finish()?;
    debug!("Archived {} files into {}", files, destination.display());
    Ok(files)
}
