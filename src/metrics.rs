// src/metrics.rs
//! The article-count gauge and its exposition, shared by the report and scrape servers.
//!
//! Each [`Metrics`] owns its own Prometheus recorder instead of installing a
//! process-global one, so several routers (and tests) can live in one process.

use std::sync::Arc;

use axum::{http::header, response::IntoResponse};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

/// Gauge: items in the most recent successful collection, labelled by `target`.
pub const ARTICLES_GAUGE: &str = "rss_articles_total";
pub const REPORT_REJECTED: &str = "rss_report_rejected_total";
pub const SCRAPE_ERRORS: &str = "rss_scrape_errors_total";
pub const SCRAPE_DURATION_MS: &str = "rss_scrape_duration_ms";
pub const LAST_SUCCESS_TS: &str = "rss_last_success_timestamp_seconds";

pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone)]
pub struct Metrics {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let this = Self {
            recorder: Arc::new(recorder),
            handle,
        };
        this.with(|| {
            describe_gauge!(ARTICLES_GAUGE, "Number of RSS articles collected");
            describe_counter!(REPORT_REJECTED, "Rejected POST /report payloads.");
            describe_counter!(SCRAPE_ERRORS, "Scrape-triggered feed fetch failures.");
            describe_histogram!(SCRAPE_DURATION_MS, "Scrape-triggered fetch time in milliseconds.");
            describe_gauge!(LAST_SUCCESS_TS, "Unix ts of the last successful collection.");
        });
        this
    }

    fn with<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(self.recorder.as_ref(), f)
    }

    /// Set the gauge for `target` to an absolute count (last write wins).
    pub fn record_collection(&self, target: &str, count: u64) {
        let now = chrono::Utc::now().timestamp().max(0) as f64;
        self.with(|| {
            gauge!(ARTICLES_GAUGE, "target" => target.to_string()).set(count as f64);
            gauge!(LAST_SUCCESS_TS, "target" => target.to_string()).set(now);
        });
    }

    pub fn record_rejected_report(&self) {
        self.with(|| counter!(REPORT_REJECTED).increment(1));
    }

    pub fn record_scrape_failure(&self, target: &str, kind: &'static str) {
        self.with(|| {
            counter!(SCRAPE_ERRORS, "target" => target.to_string(), "kind" => kind).increment(1)
        });
    }

    pub fn observe_scrape_ms(&self, target: &str, ms: f64) {
        self.with(|| histogram!(SCRAPE_DURATION_MS, "target" => target.to_string()).record(ms));
    }

    /// Prometheus exposition text.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub(crate) fn exposition(&self) -> impl IntoResponse {
        ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], self.render())
    }
}
