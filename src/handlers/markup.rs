//! # HTML Handler
//!
//! Con `add_csp` attivo, ogni `<meta http-equiv="Content-Security-Policy">`
//! esistente viene rimosso (confronto case-insensitive) e la policy fissa viene
//! inserita come primo figlio di `<head>`. Il documento viene poi minificato
//! insieme a CSS e JS inline.

use crate::error::{EngineError, EngineResult};
use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use minify_html::{minify, Cfg};
use std::path::Path;
use tokio::fs;
use tracing::debug;

pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; font-src 'self' https://fonts.gstatic.com; img-src 'self' data:;";

const CSP_HEADER: &str = "Content-Security-Policy";

/// Replace any CSP meta tag with the fixed policy at the top of `<head>`
pub fn inject_csp(html: &str) -> EngineResult<String> {
    let meta = format!(
        r#"<meta http-equiv="{}" content="{}">"#,
        CSP_HEADER, CONTENT_SECURITY_POLICY
    );
    let mut inserted = false;

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("meta[http-equiv]", |el| {
                    let is_csp = el
                        .get_attribute("http-equiv")
                        .map(|value| value.trim().eq_ignore_ascii_case(CSP_HEADER))
                        .unwrap_or(false);
                    if is_csp {
                        el.remove();
                    }
                    Ok(())
                }),
                element!("head", |el| {
                    if !inserted {
                        el.prepend(&meta, ContentType::Html);
                        inserted = true;
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| EngineError::Format(format!("HTML rewrite failed: {e}")))
}

/// Minify markup together with inline CSS and JS
pub fn minify_markup(html: &str) -> Vec<u8> {
    let mut cfg = Cfg::new();
    cfg.minify_css = true;
    cfg.minify_js = true;
    minify(html.as_bytes(), &cfg)
}

pub async fn harden(input: &Path, output: &Path, add_csp: bool) -> EngineResult<String> {
    let bytes = fs::read(input).await?;
    let mut code = String::from_utf8(bytes)
        .map_err(|_| EngineError::Format(format!("{} is not valid UTF-8", input.display())))?;

    let mut message = String::new();
    if add_csp {
        code = inject_csp(&code)?;
        message.push_str("Hardened (CSP) & ");
    }

    let minified = minify_markup(&code);
    debug!(
        "Minified {} from {} to {} bytes",
        input.display(),
        code.len(),
        minified.len()
    );
    fs::write(output, minified).await?;

    message.push_str("Minified");
    Ok(message)
}
