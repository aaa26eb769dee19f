// src/config/mod.rs
//! Process configuration: flags first, then environment (including `.env`), then defaults.

pub mod collector;
pub mod exporter;

pub use collector::CollectorArgs;
pub use exporter::{ExporterArgs, ExporterMode};

use crate::ingest::providers::ParseStrategy;

/// Load `.env` from the working directory if present; no-op otherwise.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), ".env loaded");
    }
}

pub(crate) fn parse_limit(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err("limit must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid limit '{raw}': {e}")),
    }
}

pub(crate) fn parse_strategy(raw: &str) -> Result<ParseStrategy, String> {
    raw.parse()
}
