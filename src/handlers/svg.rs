//! # SVG Handler Module
//!
//! Delega a `svgo` con la cwd nella directory del file di input.

use crate::error::EngineResult;
use crate::runner::{ToolInvocation, ToolRunner};
use std::path::Path;

/// Optimize an SVG with `svgo <input> -o <output>`; a timeout fails only this file
pub async fn optimize(runner: &ToolRunner, input: &Path, output: &Path) -> EngineResult<String> {
    let cwd = input.parent().unwrap_or(Path::new("."));
    runner
        .run(
            ToolInvocation::new("svgo", cwd)
                .arg(input)
                .arg("-o")
                .arg(output)
                .timeout(runner.timeouts().svg()),
        )
        .await?;
    Ok("SVG Optimized".to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::ToolTimeouts;
    use crate::error::EngineError;
    use crate::test_support::FakeTools;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_svgo_argv_contract() {
        let tools = FakeTools::new();
        tools.install("svgo", "[ \"$2\" = \"-o\" ] || exit 9\ncp \"$1\" \"$3\"\n");
        let runner = ToolRunner::new(tools.resolver(), ToolTimeouts::default());

        let work = TempDir::new().unwrap();
        let (input, output) = (work.path().join("icon.svg"), work.path().join("icon.out.svg"));
        std::fs::write(&input, "<svg/>").unwrap();

        assert_eq!(optimize(&runner, &input, &output).await.unwrap(), "SVG Optimized");
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "<svg/>");
    }

    #[tokio::test]
    async fn test_timeout_is_fatal_to_the_file() {
        let tools = FakeTools::new();
        tools.install("svgo", "sleep 5\n");
        let timeouts = ToolTimeouts {
            svg_secs: 1,
            ..ToolTimeouts::default()
        };
        let runner = ToolRunner::new(tools.resolver(), timeouts);

        let work = TempDir::new().unwrap();
        let input = work.path().join("slow.svg");
        std::fs::write(&input, "<svg/>").unwrap();

        let err = optimize(&runner, &input, &work.path().join("slow.out.svg"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ToolTimeout { .. }));
    }
}
