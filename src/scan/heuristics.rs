//! # Heuristic Source Scan
//!
//! Scansione riga per riga dei file di configurazione e sorgenti:
//! - **segreti**: assegnazioni di `API_KEY`, `SECRET`, `PASSWORD`, `TOKEN` a una
//!   stringa letterale di almeno 16 caratteri
//! - **debug**: righe che contengono `DEBUG` e, senza spazi, `TRUE`
//!
//! Il confronto è case-insensitive. I file illeggibili vengono saltati.

use crate::error::EngineResult;
use crate::file_manager::FileManager;
use crate::scan::ScanFinding;
use crate::utils::to_posix;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// File-name suffixes the heuristic scan reads; a bare dotfile such as `.env` matches too
pub const SCANNED_EXTENSIONS: &[&str] = &[
    "py", "js", "json", "env", "yml", "yaml", "conf", "cfg", "ini",
];

static SECRET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(API_KEY|SECRET|PASSWORD|TOKEN)\s*[:=]\s*["']([A-Za-z0-9_\-]{16,})["']"#)
        .expect("secret pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeuristicKind {
    DebugFlag,
    HardcodedSecret,
}

/// A heuristic hit at `line` (1-based) of `path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicFinding {
    pub kind: HeuristicKind,
    pub path: String,
    pub line: usize,
}

impl HeuristicFinding {
    pub fn message(&self) -> String {
        match self.kind {
            HeuristicKind::DebugFlag => format!(
                "HIGH RISK: Potential debug mode in '{}' on line {}.",
                self.path, self.line
            ),
            HeuristicKind::HardcodedSecret => format!(
                "HIGH RISK: Potential hardcoded secret in '{}' on line {}.",
                self.path, self.line
            ),
        }
    }
}

impl From<&HeuristicFinding> for ScanFinding {
    fn from(finding: &HeuristicFinding) -> Self {
        ScanFinding::high_risk(finding.message())
    }
}

pub fn is_debug_flag(line: &str) -> bool {
    let upper = line.to_uppercase();
    upper.contains("DEBUG") && upper.replace(' ', "").contains("TRUE")
}

pub fn is_hardcoded_secret(line: &str) -> bool {
    SECRET_PATTERN.is_match(line)
}

/// True when the file name ends with `.<ext>` for a scanned extension
pub fn is_scanned_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .map(|name| {
            SCANNED_EXTENSIONS
                .iter()
                .any(|ext| name.strip_suffix(ext).is_some_and(|stem| stem.ends_with('.')))
        })
        .unwrap_or(false)
}

pub struct SourceScanner;

impl SourceScanner {
    /// Findings of one file's content; debug flag is checked before secrets on each line
    pub fn scan_content(path: &str, content: &str) -> Vec<HeuristicFinding> {
        let mut findings = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;
            if is_debug_flag(line) {
                findings.push(HeuristicFinding {
                    kind: HeuristicKind::DebugFlag,
                    path: path.to_string(),
                    line: line_number,
                });
            }
            if is_hardcoded_secret(line) {
                findings.push(HeuristicFinding {
                    kind: HeuristicKind::HardcodedSecret,
                    path: path.to_string(),
                    line: line_number,
                });
            }
        }
        findings
    }

    /// Scan every file under `workspace` with a scanned extension
    pub async fn scan(workspace: &Path) -> EngineResult<Vec<HeuristicFinding>> {
        let mut findings = Vec::new();

        for file in FileManager::find_files(workspace)?
            .into_iter()
            .filter(|file| is_scanned_file(file))
        {
            let relative = file
                .strip_prefix(workspace)
                .map(to_posix)
                .unwrap_or_else(|_| file.display().to_string());

            match tokio::fs::read(&file).await {
                Ok(bytes) => {
                    let content = String::from_utf8_lossy(&bytes);
                    findings.extend(Self::scan_content(&relative, &content));
                }
                Err(e) => debug!("Skipping unreadable {}: {}", relative, e),
            }
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_secret_pattern() {
        assert!(is_hardcoded_secret(r#"PASSWORD = "abcdefghijklmnop""#));
        assert!(is_hardcoded_secret(r#"my_api_key:'AKIA_1234-5678abcd'"#));
        assert!(is_hardcoded_secret(r#"token="0123456789abcdef""#));
        // too short
        assert!(!is_hardcoded_secret(r#"SECRET = "short""#));
        // unquoted values are not literals
        assert!(!is_hardcoded_secret("PASSWORD = abcdefghijklmnopqrst"));
    }

    #[test]
    fn test_debug_marker() {
        assert!(is_debug_flag("DEBUG = True"));
        assert!(is_debug_flag("app.debug=true"));
        assert!(is_debug_flag("  debug: t r u e"));
        assert!(!is_debug_flag("DEBUG = False"));
        assert!(!is_debug_flag("verbose = true"));
    }

    #[test]
    fn test_line_numbers_and_order() {
        let content = "import os\nDEBUG = True\nDB_PASSWORD = \"abcdefghijklmnop\"\n";
        let findings = SourceScanner::scan_content("settings.py", content);

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].kind, HeuristicKind::DebugFlag);
        assert_eq!(findings[0].line, 2);
        assert_eq!(
            findings[1].message(),
            "HIGH RISK: Potential hardcoded secret in 'settings.py' on line 3."
        );
    }

    #[tokio::test]
    async fn test_only_scanned_extensions_are_read() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("conf")).unwrap();
        std::fs::write(dir.path().join("conf/app.ini"), "token = \"0123456789abcdef\"\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "PASSWORD = \"abcdefghijklmnop\"\n").unwrap();
        std::fs::write(dir.path().join("blob.js"), [0xff, 0xfe, b'\n', b'x']).unwrap();

        let findings = SourceScanner::scan(dir.path()).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "conf/app.ini");
    }

    #[test]
    fn test_scanned_file_names() {
        assert!(is_scanned_file(Path::new(".env")));
        assert!(is_scanned_file(Path::new("deploy/prod.ENV")));
        assert!(is_scanned_file(Path::new("settings.py")));
        assert!(!is_scanned_file(Path::new("environment")));
        assert!(!is_scanned_file(Path::new("notes.md")));
        assert!(!is_scanned_file(Path::new("pyproject")));
    }

    #[tokio::test]
    async fn test_dotenv_files_are_scanned() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".env"), "API_KEY=\"abcdefghijklmnopqrst\"\n").unwrap();
        std::fs::write(dir.path().join("prod.env"), "API_KEY=\"abcdefghijklmnopqrst\"\n").unwrap();

        let findings = SourceScanner::scan(dir.path()).await.unwrap();
        let paths: Vec<&str> = findings.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec![".env", "prod.env"]);
        assert!(findings.iter().all(|f| f.kind == HeuristicKind::HardcodedSecret));
    }
}
