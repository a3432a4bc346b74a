//! # Tool Path Resolver
//!
//! This module handles finding the external tools the engine drives:
//! - Tools bundled next to the engine (`tools_dir` / `TOOLS_DIR`)
//! - Node tools installed locally (`node_modules/.bin`)
//! - System-installed tools (`PATH`)

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// External tools used by the pipelines, grouped by category for reports
pub const KNOWN_TOOLS: &[(&str, &[&str])] = &[
    ("JavaScript", &["javascript-obfuscator", "terser"]),
    ("SVG", &["svgo"]),
    ("CSS", &["purgecss", "critical"]),
    ("Python analysis", &["flake8", "vulture", "pip-audit"]),
    ("Node.js audit", &["npm"]),
];

/// Tool path resolver for different deployment environments
#[derive(Debug, Clone)]
pub struct ToolPathResolver {
    /// Directories searched before the system PATH, in order
    search_dirs: Vec<PathBuf>,
    /// Whether the system PATH is consulted at all
    use_system_path: bool,
}

impl ToolPathResolver {
    /// Create a resolver from an optional configured tools directory
    pub fn new(tools_dir: Option<&Path>, use_system_path: bool) -> Self {
        let mut search_dirs = Vec::new();

        if let Some(dir) = tools_dir {
            search_dirs.push(dir.to_path_buf());
        }

        if use_system_path {
            if let Ok(dir) = env::var("TOOLS_DIR") {
                let dir = PathBuf::from(dir);
                if dir.is_dir() {
                    debug!("Found tools directory via TOOLS_DIR: {:?}", dir);
                    search_dirs.push(dir);
                }
            }

            if let Some(bin) = Self::detect_node_bin_dir() {
                search_dirs.push(bin);
            }
        }

        Self {
            search_dirs,
            use_system_path,
        }
    }

    /// Resolver that only looks in the given directories
    pub fn isolated(dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs: dirs,
            use_system_path: false,
        }
    }

    /// Look for `node_modules/.bin` by traversing up the directory tree
    fn detect_node_bin_dir() -> Option<PathBuf> {
        let mut search_dir = env::current_dir().ok()?;
        for _ in 0..10 {
            let bin = search_dir.join("node_modules").join(".bin");
            if bin.is_dir() {
                debug!("Found local node tools: {:?}", bin);
                return Some(bin);
            }
            if !search_dir.pop() {
                break;
            }
        }
        None
    }

    /// Candidate file names for a tool on this platform
    fn candidate_names(tool_name: &str) -> Vec<String> {
        if cfg!(windows) {
            vec![
                format!("{}.exe", tool_name),
                format!("{}.cmd", tool_name),
                tool_name.to_string(),
            ]
        } else {
            vec![tool_name.to_string()]
        }
    }

    fn find_in(dir: &Path, tool_name: &str) -> Option<PathBuf> {
        Self::candidate_names(tool_name)
            .into_iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        for dir in &self.search_dirs {
            if let Some(path) = Self::find_in(dir, tool_name) {
                debug!("Resolved {} -> {:?}", tool_name, path);
                return Some(path);
            }
        }

        if self.use_system_path {
            if let Some(path) = self.find_in_system_path(tool_name) {
                debug!("Using system tool: {} -> {:?}", tool_name, path);
                return Some(path);
            }
        }

        warn!("Tool not found: {}", tool_name);
        None
    }

    /// Find tool in system PATH
    fn find_in_system_path(&self, tool_name: &str) -> Option<PathBuf> {
        let path_var = env::var_os("PATH")?;
        env::split_paths(&path_var).find_map(|dir| Self::find_in(&dir, tool_name))
    }

    /// Check if a specific tool is available
    pub fn is_tool_available(&self, tool_name: &str) -> bool {
        self.resolve_tool(tool_name).is_some()
    }

    /// Get installation instructions for a tool
    fn install_instructions(tool_name: &str) -> String {
        match tool_name {
            "javascript-obfuscator" | "terser" | "svgo" | "purgecss" | "critical" => {
                format!("npm install -g {}", tool_name)
            }
            "flake8" | "vulture" | "pip-audit" => format!("pip install {}", tool_name),
            "npm" => "install Node.js from https://nodejs.org/".to_string(),
            _ => format!("install {} and make sure it is on PATH", tool_name),
        }
    }

    /// Get a report of tool availability
    pub fn get_tools_report(&self) -> String {
        let mut report = String::from("Tool Path Resolver Report\n");
        report.push_str(&format!("Search directories: {:?}\n", self.search_dirs));
        report.push_str(&format!("System PATH lookup: {}\n", self.use_system_path));
        report.push_str("\nTool Availability:\n");

        for (category, tools) in KNOWN_TOOLS {
            report.push_str(&format!("\n{}:\n", category));
            for tool in tools.iter() {
                match self.resolve_tool(tool) {
                    Some(path) => report.push_str(&format!("  ✅ {} -> {:?}\n", tool, path)),
                    None => report.push_str(&format!(
                        "  ❌ {} (install with: {})\n",
                        tool,
                        Self::install_instructions(tool)
                    )),
                }
            }
        }

        report
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new(None, true)
    }
}
