//! Test helpers: fake external tools and a recording event sink.

use crate::events::JobEvent;
use crate::progress::{EventSink, StatusLevel};
use crate::tool_resolver::ToolPathResolver;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// A directory of shell-script stand-ins for the real tools
pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn resolver(&self) -> ToolPathResolver {
        ToolPathResolver::isolated(vec![self.dir.path().to_path_buf()])
    }

    /// Install an executable `/bin/sh` script named `name`
    #[cfg(unix)]
    pub fn install(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// terser stand-in: copies its input to the `-o` target
    #[cfg(unix)]
    pub fn install_terser(&self) {
        self.install(
            "terser",
            r#"in="$1"; out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
cp "$in" "$out"
"#,
        );
    }

    /// javascript-obfuscator stand-in: copies its input to the `--output` target
    /// and records its arguments in `obfuscator.args`
    #[cfg(unix)]
    pub fn install_obfuscator(&self) {
        let log = self.dir.path().join("obfuscator.args");
        self.install(
            "javascript-obfuscator",
            &format!(
                r#"echo "$@" > "{log}"
in="$1"; out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--output" ]; then out="$2"; fi
  shift
done
cp "$in" "$out"
"#,
                log = log.display()
            ),
        );
    }

    /// purgecss stand-in: appends every `--css` file's content to `purge.seen`
    /// and records its arguments in `purge.args`
    #[cfg(unix)]
    pub fn install_purgecss(&self) {
        let seen = self.dir.path().join("purge.seen");
        let args = self.dir.path().join("purge.args");
        self.install(
            "purgecss",
            &format!(
                r#"echo "$@" >> "{args}"
mode=""
for a in "$@"; do
  case "$a" in
    --css|--content|--output|--safelist) mode="$a" ;;
    *) if [ "$mode" = "--css" ]; then cat "$a" >> "{seen}"; fi ;;
  esac
done
"#,
                seen = seen.display(),
                args = args.display()
            ),
        );
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).unwrap_or_default()
    }
}

/// Sink that keeps every event in emission order
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<JobEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<JobEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<(String, StatusLevel)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                JobEvent::Status { message, level } => Some((message, level)),
                _ => None,
            })
            .collect()
    }

    pub fn has_status(&self, needle: &str, level: StatusLevel) -> bool {
        self.statuses()
            .iter()
            .any(|(message, l)| *l == level && message.contains(needle))
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: JobEvent) {
        self.events.lock().unwrap().push(event);
    }
}
