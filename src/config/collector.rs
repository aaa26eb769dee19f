// src/config/collector.rs
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use super::{parse_limit, parse_strategy};
use crate::artifact::github::{GithubSink, DEFAULT_API_URL, DEFAULT_BRANCH};
use crate::artifact::DEFAULT_DATA_DIR;
use crate::ingest::providers::ParseStrategy;
use crate::report::ReportClient;

pub const DEFAULT_COLLECTOR_LIMIT: usize = 3;

/// Fetch one feed, write `data/<date>/<target>.json`, optionally mirror and report it.
#[derive(Debug, Clone, Parser)]
#[command(name = "rss-collector", version, about)]
pub struct CollectorArgs {
    /// Feed to collect (e.g. mk_economy, hk_it).
    #[arg(long, env = "TARGET")]
    pub target: Option<String>,

    /// Maximum number of items to keep.
    #[arg(long, env = "RSS_LIMIT", default_value_t = DEFAULT_COLLECTOR_LIMIT, value_parser = parse_limit)]
    pub limit: usize,

    /// Directory that stands in for the artifact path's leading `data/`.
    #[arg(long, env = "DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Feed parser: `tolerant` (RSS/Atom) or `direct` (RSS channel/item only).
    #[arg(long, env = "RSS_PARSER", default_value = "tolerant", value_parser = parse_strategy)]
    pub parser: ParseStrategy,

    /// Feed request timeout in seconds.
    #[arg(long, env = "RSS_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Feed registry file (TOML or JSON); defaults to config/feeds.* or the built-in table.
    #[arg(long, env = "FEED_REGISTRY_PATH")]
    pub registry: Option<PathBuf>,

    /// Exporter `/report` URL; the count is pushed only when set.
    #[arg(long, env = "REPORT_ENDPOINT")]
    pub report_endpoint: Option<String>,

    /// `owner/repo` to mirror the artifact into.
    #[arg(long, env = "GITHUB_REPO", hide_env_values = true)]
    pub github_repo: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    #[arg(long, env = "GITHUB_BRANCH", default_value = DEFAULT_BRANCH)]
    pub github_branch: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub github_api_url: String,

    /// Log output: `compact` or `json`.
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: String,
}

impl CollectorArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Remote mirroring needs both repo and token; either missing disables it.
    pub fn github_sink(&self) -> Option<GithubSink> {
        let repo = self.github_repo.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let token = self.github_token.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some(
            GithubSink::new(repo, token)
                .with_api_url(self.github_api_url.clone())
                .with_branch(self.github_branch.clone()),
        )
    }

    pub fn report_client(&self) -> Option<ReportClient> {
        self.report_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ReportClient::new)
    }
}
