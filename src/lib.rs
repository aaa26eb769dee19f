// src/lib.rs
// Public library surface for both binaries and the integration tests.

pub mod api;
pub mod artifact;
pub mod collector;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod report;

pub use crate::collector::{Collector, RunOutcome};
pub use crate::error::{CollectError, FeedError, FetchError};
pub use crate::ingest::types::Item;
pub use crate::ingest::FeedFetcher;
pub use crate::metrics::Metrics;
