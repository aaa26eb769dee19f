// src/error.rs
//! Error taxonomy shared by the collector and the exporter.

use std::time::Duration;

use thiserror::Error;

/// Transport-level failure while retrieving a feed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("server answered HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl FetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return Self::Timeout(timeout);
        }
        match err.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::Transport(err),
        }
    }
}

/// Everything that can go wrong in `FeedFetcher::fetch`.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("feed at {url} returned 0 items; check the feed URL")]
    EmptyFeed { url: String },
}

impl FeedError {
    /// Short label used for logs and the `kind` metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Parse(_) => "parse",
            Self::EmptyFeed { .. } => "empty",
        }
    }
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact I/O on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Remote sink failure. "Not found" is NOT an error; lookups return `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink rejected credentials (HTTP {0})")]
    Unauthorized(u16),

    #[error("sink answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("sink request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected sink response: {0}")]
    Decode(String),

    #[error("could not encode artifact: {0}")]
    Encode(#[from] serde_json::Error),
}

/// [`SinkError`] tagged with the upsert phase it came from.
#[derive(Debug, Error)]
pub enum UpsertError {
    /// The sink could not say whether the path exists (auth, transport, server error).
    #[error("remote lookup failed: {0}")]
    Lookup(#[source] SinkError),

    #[error("remote write failed: {0}")]
    Write(#[source] SinkError),
}

impl UpsertError {
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }
}

/// Metric push failure. Always logged and swallowed by callers.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("report endpoint answered HTTP {0}")]
    Status(u16),
}

/// Fatal outcomes of a collector run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("a target is required (one of: {known})")]
    MissingTarget { known: String },

    #[error("unknown target '{target}' (known: {known}){}", did_you_mean(.suggestion))]
    UnknownTarget {
        target: String,
        known: String,
        suggestion: Option<String>,
    },

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_deref()
        .map(|s| format!("; did you mean '{s}'?"))
        .unwrap_or_default()
}
