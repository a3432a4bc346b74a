//! # Utility Functions Module
//!
//! Small helpers for building tool arguments and rendering report paths.

use std::path::Path;

/// Macro for argument building with mixed item types.
///
/// # Example
/// ```rust
/// use project_suite::args;
///
/// let width = 1200;
/// let args = args!["-w", width, "--inline"];
/// assert_eq!(args, vec!["-w", "1200", "--inline"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        {
            let items: Vec<String> = vec![$(($item).to_string()),*];
            items
        }
    };
}

/// Render a relative path with `/` separators regardless of platform
pub fn to_posix(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_args_macro_accepts_mixed_types() {
        let height = 900;
        let result = args!["-h", height, "--extract"];
        assert_eq!(result, vec!["-h".to_string(), "900".to_string(), "--extract".to_string()]);
    }

    #[test]
    fn test_to_posix_joins_components() {
        let path: PathBuf = ["assets", "css", "site.css"].iter().collect();
        assert_eq!(to_posix(&path), "assets/css/site.css");
        assert_eq!(to_posix(Path::new("index.html")), "index.html");
    }
}
