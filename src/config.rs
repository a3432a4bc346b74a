//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione dell'engine.
//!
//! ## Responsabilità:
//! - Definisce `EngineConfig` con i path delle workspace e le policy dei tool
//! - Fornisce validazione dei parametri
//! - Supporta caricamento/salvataggio da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `unpacked_root`: directory con gli archivi estratti, una sotto-directory per sessione
//! - `processed_root`: directory di output e degli archivi risultato
//! - `cache_dir`: cache condivisa dei tool (es. `pip-audit`)
//! - `tools_dir`: directory opzionale con tool bundled
//! - `use_system_path`: cerca i tool anche nel `PATH` di sistema (default: true)
//! - `timeouts`: timeout per ruolo di tool, in secondi
//! - `json_output`: eventi JSON su stdout invece della progress bar

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timeouts (seconds) for each external tool role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolTimeouts {
    pub default_secs: u64,
    pub obfuscator_secs: u64,
    pub minifier_secs: u64,
    pub svg_secs: u64,
    pub purge_secs: u64,
    pub critical_secs: u64,
    pub lint_secs: u64,
    pub pip_audit_secs: u64,
    pub npm_install_secs: u64,
    pub npm_audit_secs: u64,
}

impl Default for ToolTimeouts {
    fn default() -> Self {
        Self {
            default_secs: 300,
            obfuscator_secs: 300,
            minifier_secs: 300,
            svg_secs: 120,
            purge_secs: 180,
            critical_secs: 300,
            lint_secs: 120,
            pip_audit_secs: 180,
            npm_install_secs: 300,
            npm_audit_secs: 120,
        }
    }
}

impl ToolTimeouts {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_secs)
    }
    pub fn obfuscator(&self) -> Duration {
        Duration::from_secs(self.obfuscator_secs)
    }
    pub fn minifier(&self) -> Duration {
        Duration::from_secs(self.minifier_secs)
    }
    pub fn svg(&self) -> Duration {
        Duration::from_secs(self.svg_secs)
    }
    pub fn purge(&self) -> Duration {
        Duration::from_secs(self.purge_secs)
    }
    pub fn critical(&self) -> Duration {
        Duration::from_secs(self.critical_secs)
    }
    pub fn lint(&self) -> Duration {
        Duration::from_secs(self.lint_secs)
    }
    pub fn pip_audit(&self) -> Duration {
        Duration::from_secs(self.pip_audit_secs)
    }
    pub fn npm_install(&self) -> Duration {
        Duration::from_secs(self.npm_install_secs)
    }
    pub fn npm_audit(&self) -> Duration {
        Duration::from_secs(self.npm_audit_secs)
    }

    fn all(&self) -> [u64; 10] {
        [
            self.default_secs,
            self.obfuscator_secs,
            self.minifier_secs,
            self.svg_secs,
            self.purge_secs,
            self.critical_secs,
            self.lint_secs,
            self.pip_audit_secs,
            self.npm_install_secs,
            self.npm_audit_secs,
        ]
    }
}

/// Configuration for the session processing engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root of the extracted session workspaces
    pub unpacked_root: PathBuf,
    /// Root of the processed session workspaces and result archives
    pub processed_root: PathBuf,
    /// Shared cache for tool downloads
    pub cache_dir: PathBuf,
    /// Optional directory with bundled tools
    pub tools_dir: Option<PathBuf>,
    /// Also look for tools on the system PATH
    pub use_system_path: bool,
    /// Timeouts per tool role
    pub timeouts: ToolTimeouts,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("project-suite");
        let cache_dir = dirs::cache_dir()
            .map(|dir| dir.join("project-suite"))
            .unwrap_or_else(|| base.join("cache"));

        Self {
            unpacked_root: base.join("unpacked"),
            processed_root: base.join("processed"),
            cache_dir,
            tools_dir: None,
            use_system_path: true,
            timeouts: ToolTimeouts::default(),
            json_output: false,
        }
    }
}

impl EngineConfig {
    /// Configuration rooted in a single base directory
    pub fn rooted_at(base: &Path) -> Self {
        Self {
            unpacked_root: base.join("unpacked"),
            processed_root: base.join("processed"),
            cache_dir: base.join("cache"),
            ..Self::default()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.timeouts.all().iter().any(|&secs| secs == 0) {
            return Err(anyhow::anyhow!("Tool timeouts must be greater than 0 seconds"));
        }

        if self.unpacked_root == self.processed_root {
            return Err(anyhow::anyhow!(
                "Unpacked and processed roots must be different directories: {}",
                self.unpacked_root.display()
            ));
        }

        if let Some(ref tools_dir) = self.tools_dir {
            if !tools_dir.is_dir() {
                return Err(anyhow::anyhow!(
                    "Tools directory does not exist: {}",
                    tools_dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Create every root directory the engine writes into
    pub async fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.unpacked_root, &self.processed_root, &self.cache_dir] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
