//! # Processing Options Module
//!
//! Opzioni immutabili di un singolo job, ricevute dal client come mappa JSON.
//!
//! ## Opzioni riconosciute:
//! - `obfuscate_js`: `none` | `basic` | `strong` (default: `none`)
//! - `add_csp`: inserisce un meta Content-Security-Policy negli HTML
//! - `purge_css`: rimuove i selettori CSS non usati prima della minificazione
//! - `generate_critical_css`: inlining del critical CSS (solo piano `pro`)
//!
//! Chiavi sconosciute o valori di tipo errato vengono ignorati: il parsing non
//! fallisce mai, si ricade sul valore di default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Intensity of the JavaScript obfuscation stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObfuscationLevel {
    #[default]
    None,
    Basic,
    Strong,
}

impl ObfuscationLevel {
    fn parse(value: &Value) -> Self {
        match value.as_str().map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("basic") => Self::Basic,
            Some("strong") => Self::Strong,
            _ => Self::None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self != Self::None
    }
}

impl fmt::Display for ObfuscationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Basic => "basic",
            Self::Strong => "strong",
        };
        f.write_str(name)
    }
}

/// Per-job processing options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ProcessingOptions {
    pub obfuscate_js: ObfuscationLevel,
    pub add_csp: bool,
    pub purge_css: bool,
    pub generate_critical_css: bool,
}

impl ProcessingOptions {
    /// Build options from a loosely typed client map
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let flag = |key: &str| map.get(key).map(truthy).unwrap_or(false);

        Self {
            obfuscate_js: map
                .get("obfuscate_js")
                .map(ObfuscationLevel::parse)
                .unwrap_or_default(),
            add_csp: flag("add_csp"),
            purge_css: flag("purge_css"),
            generate_critical_css: flag("generate_critical_css"),
        }
    }

    /// Parse options from a JSON object string (used by the CLI)
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(raw)?;
        Ok(Self::from_map(&map))
    }
}

impl From<Map<String, Value>> for ProcessingOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(&map)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => false,
    }
}
