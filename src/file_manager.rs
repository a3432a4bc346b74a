//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file della workspace di sessione.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva dei file regolari in ordine stabile
//!   (lessicografico per livello di directory)
//! - Estensione normalizzata in lowercase per il routing
//! - Copia byte-per-byte e copia di alberi di directory
//! - Utilità per dimensioni e percentuali di riduzione
//!
//! ## Esempio:
//! ```rust,no_run
//! use project_suite::file_manager::FileManager;
//! use std::path::Path;
//!
//! let files = FileManager::find_files(Path::new("/tmp/unpacked/session"))?;
//! for file in files {
//!     println!("{}", file.display());
//! }
//! # Ok::<(), project_suite::EngineError>(())
//! ```

use crate::error::EngineResult;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Get the size of a file in bytes
    pub async fn file_size(path: &Path) -> EngineResult<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Find every regular file under `dir`, sorted by name at each level
    pub fn find_files(dir: &Path) -> EngineResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Find the files under `dir` whose lowercase extension is in `extensions`
    pub fn find_files_with_extensions(
        dir: &Path,
        extensions: &[&str],
    ) -> EngineResult<Vec<PathBuf>> {
        Ok(Self::find_files(dir)?
            .into_iter()
            .filter(|path| {
                Self::lowercase_extension(path)
                    .map(|ext| extensions.contains(&ext.as_str()))
                    .unwrap_or(false)
            })
            .collect())
    }

    /// True if any file under `dir` has the given extension
    pub fn contains_extension(dir: &Path, extension: &str) -> bool {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .any(|e| Self::lowercase_extension(e.path()).as_deref() == Some(extension))
    }

    /// Lowercase extension of a path, if any
    pub fn lowercase_extension(path: &Path) -> Option<String> {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Byte-for-byte copy, creating parent directories
    pub async fn copy_file(from: &Path, to: &Path) -> EngineResult<u64> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(fs::copy(from, to).await?)
    }

    /// Copy a whole directory tree into `to`
    pub async fn copy_tree(from: &Path, to: &Path) -> EngineResult<usize> {
        let files = Self::find_files(from)?;
        for file in &files {
            let relative = file.strip_prefix(from).unwrap_or(file);
            Self::copy_file(file, &to.join(relative)).await?;
        }
        Ok(files.len())
    }

    /// True if `dir` exists and has at least one entry
    pub async fn is_non_empty_dir(dir: &Path) -> EngineResult<bool> {
        match fs::read_dir(dir).await {
            Ok(mut entries) => Ok(entries.next_entry().await?.is_some()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, rel).unwrap();
    }

    #[test]
    fn test_find_files_is_sorted_per_level() {
        let temp_dir = TempDir::new().unwrap();
        for rel in ["b.txt", "a/z.js", "a/c.css", "C.html", "a/b/d.png"] {
            touch(temp_dir.path(), rel);
        }

        let files: Vec<String> = FileManager::find_files(temp_dir.path())
            .unwrap()
            .iter()
            .map(|p| crate::utils::to_posix(p.strip_prefix(temp_dir.path()).unwrap()))
            .collect();

        assert_eq!(files, vec!["C.html", "a/b/d.png", "a/c.css", "a/z.js", "b.txt"]);
    }

    #[test]
    fn test_extension_helpers() {
        assert_eq!(FileManager::lowercase_extension(Path::new("Logo.PNG")).as_deref(), Some("png"));
        assert_eq!(FileManager::lowercase_extension(Path::new("Makefile")), None);

        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "pkg/app.PY");
        touch(temp_dir.path(), "README.md");
        assert!(FileManager::contains_extension(temp_dir.path(), "py"));
        assert!(!FileManager::contains_extension(temp_dir.path(), "js"));

        let found =
            FileManager::find_files_with_extensions(temp_dir.path(), &["md", "txt"]).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_copy_tree_mirrors_structure() {
        let from = TempDir::new().unwrap();
        let to = TempDir::new().unwrap();
        touch(from.path(), "deep/er/file.bin");
        touch(from.path(), "top.txt");

        let copied = FileManager::copy_tree(from.path(), &to.path().join("out")).await.unwrap();
        assert_eq!(copied, 2);
        assert!(to.path().join("out/deep/er/file.bin").is_file());
        assert!(FileManager::is_non_empty_dir(&to.path().join("out")).await.unwrap());
        assert!(!FileManager::is_non_empty_dir(&to.path().join("nope")).await.unwrap());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(2048), "2.00 KB");
        assert_eq!(FileManager::calculate_reduction(200, 50), 75.0);
        assert_eq!(FileManager::calculate_reduction(0, 50), 0.0);
    }
}
