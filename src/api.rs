// src/api.rs
//! Exporter HTTP surface.
//!
//! - report mode: `POST /report` sets the gauge from a collector push, `GET /metrics` renders it.
//! - scrape mode: every `GET /metrics` fetches the configured feed and sets the gauge first.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::error::FeedError;
use crate::ingest::registry::FeedRegistry;
use crate::ingest::types::FeedTarget;
use crate::ingest::FeedFetcher;
use crate::metrics::Metrics;
use crate::report::ReportPayload;

async fn health() -> &'static str {
    "ok"
}

fn status_json(code: StatusCode, body: Value) -> Response {
    (code, Json(body)).into_response()
}

/// Handler panics become `500 {"status":"error","reason":..}` instead of a dropped connection.
fn panic_to_json(err: Box<dyn Any + Send + 'static>) -> Response {
    let reason = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "internal error".to_string()
    };
    tracing::error!(%reason, "handler panicked");
    status_json(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "status": "error", "reason": reason }),
    )
}

// ---------------------------------------------------------------------------
// report mode
// ---------------------------------------------------------------------------

pub fn report_router(metrics: Metrics) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/report", post(report))
        .route("/metrics", get(render_metrics))
        .layer(CatchPanicLayer::custom(panic_to_json))
        .layer(TraceLayer::new_for_http())
        .with_state(metrics)
}

/// Accepts `{"target": <non-empty string>, "count": <integer >= 0>}` and nothing else.
pub fn parse_report(body: &[u8]) -> Option<ReportPayload> {
    let v: Value = serde_json::from_slice(body).ok()?;
    let target = v.get("target")?.as_str()?.trim();
    if target.is_empty() {
        return None;
    }
    let count = v.get("count")?.as_u64()?;
    Some(ReportPayload {
        target: target.to_string(),
        count,
    })
}

async fn report(State(metrics): State<Metrics>, body: Bytes) -> Response {
    match parse_report(&body) {
        Some(p) => {
            metrics.record_collection(&p.target, p.count);
            tracing::info!(target_id = %p.target, count = p.count, "report accepted");
            status_json(StatusCode::OK, json!({ "status": "ok" }))
        }
        None => {
            metrics.record_rejected_report();
            tracing::warn!(bytes = body.len(), "report rejected");
            status_json(
                StatusCode::BAD_REQUEST,
                json!({ "status": "error", "reason": "invalid data" }),
            )
        }
    }
}

async fn render_metrics(State(metrics): State<Metrics>) -> Response {
    metrics.exposition().into_response()
}

// ---------------------------------------------------------------------------
// scrape mode
// ---------------------------------------------------------------------------

/// The scrape server's target, resolved once at startup.
#[derive(Debug, Clone)]
pub enum ScrapeTarget {
    Resolved(FeedTarget),
    Unresolved(String),
}

impl ScrapeTarget {
    pub fn resolve(registry: &FeedRegistry, requested: Option<&str>) -> Self {
        registry
            .resolve(requested.unwrap_or_default())
            .map_or_else(|e| Self::Unresolved(e.to_string()), Self::Resolved)
    }
}

type SharedCount = Shared<BoxFuture<'static, Result<usize, Arc<FeedError>>>>;

#[derive(Clone)]
pub struct ScrapeState {
    inner: Arc<ScrapeInner>,
}

struct ScrapeInner {
    target: ScrapeTarget,
    fetcher: FeedFetcher,
    limit: usize,
    metrics: Metrics,
    in_flight: Mutex<Option<(u64, SharedCount)>>,
    generation: AtomicU64,
}

impl ScrapeState {
    pub fn new(target: ScrapeTarget, fetcher: FeedFetcher, limit: usize, metrics: Metrics) -> Self {
        Self {
            inner: Arc::new(ScrapeInner {
                target,
                fetcher,
                limit,
                metrics,
                in_flight: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    /// Concurrent scrapes share one upstream fetch while it is running.
    ///
    /// The fetch is driven by its own task, so it completes and frees the slot
    /// even when every scrape waiting on it has been dropped.
    async fn fetch_count(&self, target: &FeedTarget) -> Result<usize, Arc<FeedError>> {
        let fut = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match slot.as_ref() {
                Some((_, fut)) => fut.clone(),
                None => {
                    let g = self.inner.generation.fetch_add(1, Ordering::Relaxed);
                    let fetcher = self.inner.fetcher.clone();
                    let url = target.url.clone();
                    let limit = self.inner.limit;
                    let fut: SharedCount = async move {
                        fetcher
                            .fetch(&url, limit)
                            .await
                            .map(|items| items.len())
                            .map_err(Arc::new)
                    }
                    .boxed()
                    .shared();
                    *slot = Some((g, fut.clone()));

                    let driver = fut.clone();
                    let inner = Arc::clone(&self.inner);
                    tokio::spawn(async move {
                        let _ = driver.await;
                        inner.release(g);
                    });
                    fut
                }
            }
        };
        fut.await
    }
}

impl ScrapeInner {
    fn release(&self, generation: u64) {
        let mut slot = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if matches!(slot.as_ref(), Some((g, _)) if *g == generation) {
            *slot = None;
        }
    }
}

fn scrape_failure_status(e: &FeedError) -> StatusCode {
    match e {
        FeedError::Fetch(_) => StatusCode::BAD_GATEWAY,
        FeedError::Parse(_) | FeedError::EmptyFeed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn scrape(State(state): State<ScrapeState>) -> Response {
    let target = match &state.inner.target {
        ScrapeTarget::Resolved(t) => t.clone(),
        ScrapeTarget::Unresolved(reason) => {
            tracing::error!(%reason, "scrape target not configured");
            return (StatusCode::INTERNAL_SERVER_ERROR, reason.clone()).into_response();
        }
    };

    let metrics = state.metrics();
    let t0 = Instant::now();
    let result = state.fetch_count(&target).await;
    metrics.observe_scrape_ms(&target.id, t0.elapsed().as_secs_f64() * 1_000.0);

    match result {
        Ok(count) => {
            metrics.record_collection(&target.id, count as u64);
            metrics.exposition().into_response()
        }
        Err(e) => {
            metrics.record_scrape_failure(&target.id, e.kind());
            tracing::warn!(error = %e, target_id = %target.id, "scrape fetch failed");
            (scrape_failure_status(&e), format!("{e}\n")).into_response()
        }
    }
}

pub fn scrape_router(state: ScrapeState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(scrape))
        .layer(CatchPanicLayer::custom(panic_to_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves on ctrl-c. If the handler cannot be installed, logs it and never resolves.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
}
