// src/report.rs
//! Push variant: the collector posts `{target, count}` to the exporter after a run.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ReportError;

pub const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportPayload {
    pub target: String,
    pub count: u64,
}

#[derive(Clone, Debug)]
pub struct ReportClient {
    endpoint: String,
    client: Client,
    timeout: Duration,
}

impl ReportClient {
    /// `endpoint` is the full URL, e.g. `http://exporter:8000/report`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
            timeout: DEFAULT_REPORT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Single attempt, no retries.
    pub async fn send(&self, target: &str, count: u64) -> Result<(), ReportError> {
        let payload = ReportPayload {
            target: target.to_string(),
            count,
        };
        let rsp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;
        if !rsp.status().is_success() {
            return Err(ReportError::Status(rsp.status().as_u16()));
        }
        Ok(())
    }

    /// Fire-and-forget: failures are logged and never reach the caller.
    pub async fn send_best_effort(&self, target: &str, count: u64) -> bool {
        match self.send(target, count).await {
            Ok(()) => {
                tracing::info!(target_id = target, count, endpoint = %self.endpoint, "metric reported");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, target_id = target, endpoint = %self.endpoint, "metric report failed");
                false
            }
        }
    }
}
