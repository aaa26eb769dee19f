// src/ingest/mod.rs
pub mod providers;
pub mod registry;
pub mod types;

use std::time::{Duration, Instant};

use crate::error::{FeedError, FetchError};
use crate::ingest::providers::ParseStrategy;
use crate::ingest::types::{collection_instant, Item};

/// Items kept per fetch when the caller does not say otherwise.
pub const DEFAULT_LIMIT: usize = 5;
/// Single-attempt timeout for the feed GET.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("rss-collector/", env!("CARGO_PKG_VERSION"));

/// Retrieves one feed per call and normalizes its first `limit` entries.
///
/// No retries: one GET, one parse. Retry policy belongs to whoever schedules us.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
    strategy: ParseStrategy,
}

impl Default for FeedFetcher {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl FeedFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_FETCH_TIMEOUT,
            strategy: ParseStrategy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_strategy(mut self, strategy: ParseStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Fetch `url` and return at most `limit` items in feed order.
    ///
    /// A `limit` of 0 is treated as 1.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Fetch`] on connection errors, timeout or a non-2xx status.
    /// - [`FeedError::Parse`] when the body is not a usable feed document.
    /// - [`FeedError::EmptyFeed`] when the document holds no entries.
    pub async fn fetch(&self, url: &str, limit: usize) -> Result<Vec<Item>, FeedError> {
        let t0 = Instant::now();
        let body = match self.get_body(url).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, url, "feed http error");
                return Err(e.into());
            }
        };

        let entries = self.strategy.parse(&body).inspect_err(|e| {
            tracing::warn!(error = %e, url, parser = %self.strategy, "feed parse error");
        })?;
        let found = entries.len();

        let items = normalize(entries, limit);
        if items.is_empty() {
            return Err(FeedError::EmptyFeed {
                url: url.to_string(),
            });
        }

        tracing::debug!(
            url,
            found,
            kept = items.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "feed fetched"
        );
        Ok(items)
    }

    async fn get_body(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let map = |e| FetchError::from_reqwest(e, self.timeout);
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let bytes = resp.bytes().await.map_err(map)?;
        Ok(bytes.to_vec())
    }
}

/// Keep the first `limit` entries and stamp them with one collection instant.
pub fn normalize(entries: Vec<types::RawEntry>, limit: usize) -> Vec<Item> {
    let fetched_at = collection_instant();
    entries
        .into_iter()
        .take(limit.max(1))
        .map(|e| Item::from_entry_at(e, fetched_at))
        .collect()
}
