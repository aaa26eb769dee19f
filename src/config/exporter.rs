// src/config/exporter.rs
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use super::{parse_limit, parse_strategy};
use crate::ingest::providers::ParseStrategy;
use crate::ingest::DEFAULT_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExporterMode {
    /// Gauge is set by collectors via `POST /report`.
    Report,
    /// Gauge is refreshed by fetching the feed on every `GET /metrics`.
    Scrape,
}

/// Prometheus exporter for collected RSS item counts.
#[derive(Debug, Clone, Parser)]
#[command(name = "rss-exporter", version, about)]
pub struct ExporterArgs {
    #[arg(long, env = "EXPORTER_MODE", value_enum, default_value_t = ExporterMode::Report)]
    pub mode: ExporterMode,

    #[arg(long, env = "EXPORTER_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Feed to fetch on each scrape (scrape mode only).
    #[arg(long, env = "TARGET")]
    pub target: Option<String>,

    #[arg(long, env = "RSS_LIMIT", default_value_t = DEFAULT_LIMIT, value_parser = parse_limit)]
    pub limit: usize,

    #[arg(long, env = "RSS_PARSER", default_value = "tolerant", value_parser = parse_strategy)]
    pub parser: ParseStrategy,

    #[arg(long, env = "RSS_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    #[arg(long, env = "FEED_REGISTRY_PATH")]
    pub registry: Option<PathBuf>,

    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: String,
}

impl ExporterArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
