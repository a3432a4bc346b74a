//! # Script Handler
//!
//! Due stadi esterni opzionali e sequenziali:
//! 1. **Offuscamento** (`javascript-obfuscator`), saltato con livello `none`;
//!    `strong` aggiunge string-array encoding e trasformazione delle chiavi.
//!    Produce un file intermedio `<output>.tmp.js`.
//! 2. **Minificazione** (`terser`) del file corrente (intermedio o originale).
//!
//! Il file intermedio viene sempre rimosso, anche quando la minificazione fallisce.

use crate::args;
use crate::error::{EngineError, EngineResult};
use crate::handlers::Outcome;
use crate::optimizer::report::FileStatus;
use crate::options::ObfuscationLevel;
use crate::runner::{ToolInvocation, ToolRunner};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Scratch file removed when it goes out of scope
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn beside(output: &Path) -> Self {
        let mut name = OsString::from(output.as_os_str());
        name.push(".tmp.js");
        Self {
            path: PathBuf::from(name),
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed intermediate file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Obfuscation + minification for JavaScript files
pub struct ScriptProcessor<'a> {
    runner: &'a ToolRunner,
}

impl<'a> ScriptProcessor<'a> {
    pub fn new(runner: &'a ToolRunner) -> Self {
        Self { runner }
    }

    fn obfuscator_flags(level: ObfuscationLevel) -> Vec<String> {
        let mut flags = args!["--compact", "true"];
        if level == ObfuscationLevel::Strong {
            flags.extend(args!["--string-array", "true", "--transform-object-keys", "true"]);
        }
        flags
    }

    pub async fn process(
        &self,
        input: &Path,
        output: &Path,
        level: ObfuscationLevel,
    ) -> EngineResult<Outcome> {
        let cwd = input.parent().unwrap_or(Path::new("."));
        let intermediate = ScratchFile::beside(output);
        let mut current = input;
        let mut stages = Vec::new();
        let mut skipped_obfuscation = None;

        if level.is_enabled() {
            let invocation = ToolInvocation::new("javascript-obfuscator", cwd)
                .arg(input)
                .arg("--output")
                .arg(&intermediate.path)
                .args(Self::obfuscator_flags(level))
                .timeout(self.runner.timeouts().obfuscator());

            match self.runner.run(invocation).await {
                Ok(_) => {
                    current = &intermediate.path;
                    stages.push(format!("Obfuscated ({})", level));
                }
                Err(e @ EngineError::ToolTimeout { .. }) => return Err(e),
                Err(e) => {
                    warn!("Obfuscation failed for {}: {}", input.display(), e);
                    skipped_obfuscation = Some(e.to_string());
                }
            }
        }

        self.runner
            .run(
                ToolInvocation::new("terser", cwd)
                    .arg(current)
                    .arg("-o")
                    .arg(output)
                    .args(["--compress", "--mangle"])
                    .timeout(self.runner.timeouts().minifier()),
            )
            .await?;
        stages.push("Minified".to_string());

        let message = stages.join(" & ");
        Ok(match skipped_obfuscation {
            Some(reason) => Outcome::with_status(
                FileStatus::Warning,
                format!("{} (obfuscation skipped: {})", message, reason),
            ),
            None => Outcome::success(message),
        })
    }
}
