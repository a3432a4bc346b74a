//! # Transform Handlers
//!
//! Un handler per tipo di file, selezionato tramite una tabella statica di
//! estensioni. Le estensioni sconosciute finiscono esplicitamente nella variante
//! `Passthrough` (copia byte-per-byte, segnalata come warning).
//!
//! | Estensione | Handler |
//! |------------|---------|
//! | png, jpg, jpeg | `Image` |
//! | svg | `Svg` |
//! | js | `Script` |
//! | html | `Markup` |
//! | css | `Stylesheet` (copia, minificazione rimandata) |
//! | altro | `Passthrough` |

pub mod raster;
pub mod markup;
pub mod script;
pub mod stylesheet;
pub mod svg;

use crate::error::EngineResult;
use crate::file_manager::FileManager;
use crate::optimizer::report::FileStatus;
use crate::options::ProcessingOptions;
use crate::runner::ToolRunner;
use std::path::Path;

/// Closed set of per-file transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Image,
    Svg,
    Script,
    Markup,
    Stylesheet,
    Passthrough,
}

const EXTENSION_TABLE: &[(&str, HandlerKind)] = &[
    ("png", HandlerKind::Image),
    ("jpg", HandlerKind::Image),
    ("jpeg", HandlerKind::Image),
    ("svg", HandlerKind::Svg),
    ("js", HandlerKind::Script),
    ("html", HandlerKind::Markup),
    ("css", HandlerKind::Stylesheet),
];

impl HandlerKind {
    /// Route a file by its lowercase extension
    pub fn for_path(path: &Path) -> Self {
        FileManager::lowercase_extension(path)
            .and_then(|ext| {
                EXTENSION_TABLE
                    .iter()
                    .find(|(known, _)| *known == ext)
                    .map(|(_, kind)| *kind)
            })
            .unwrap_or(HandlerKind::Passthrough)
    }

    pub fn label(&self) -> &'static str {
        match self {
            HandlerKind::Image => "image",
            HandlerKind::Svg => "svg",
            HandlerKind::Script => "javascript",
            HandlerKind::Markup => "html",
            HandlerKind::Stylesheet => "css",
            HandlerKind::Passthrough => "copy",
        }
    }
}

/// What a handler reports for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: FileStatus,
    pub message: String,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: FileStatus::Success,
            message: message.into(),
        }
    }

    pub fn with_status(status: FileStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Shared inputs of every handler call
pub struct TransformContext<'a> {
    pub runner: &'a ToolRunner,
    pub options: &'a ProcessingOptions,
}

/// Run the handler for `kind`, writing `output` from `input`
pub async fn transform(
    kind: HandlerKind,
    ctx: &TransformContext<'_>,
    input: &Path,
    output: &Path,
) -> EngineResult<Outcome> {
    match kind {
        HandlerKind::Image => raster::optimize(input, output).await.map(Outcome::success),
        HandlerKind::Svg => svg::optimize(ctx.runner, input, output).await.map(Outcome::success),
        HandlerKind::Script => {
            script::ScriptProcessor::new(ctx.runner)
                .process(input, output, ctx.options.obfuscate_js)
                .await
        }
        HandlerKind::Markup => markup::harden(input, output, ctx.options.add_csp)
            .await
            .map(Outcome::success),
        HandlerKind::Stylesheet => stylesheet::stage(input, output).await,
        HandlerKind::Passthrough => {
            FileManager::copy_file(input, output).await?;
            Ok(Outcome::with_status(FileStatus::Warning, "Copied as-is."))
        }
    }
}
