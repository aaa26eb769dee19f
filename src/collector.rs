// src/collector.rs
//! One collection run: resolve, fetch, write locally, then the optional remote mirror and report push.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};

use crate::artifact::sink::{upsert_remote, ArtifactSink, UpsertAction};
use crate::artifact::{artifact_path, ArtifactWriter};
use crate::error::{CollectError, UpsertError};
use crate::ingest::registry::FeedRegistry;
use crate::ingest::FeedFetcher;
use crate::report::ReportClient;

/// Wiring for a single run; every field except `registry`, `fetcher` and `writer` is optional.
pub struct Collector<'a> {
    pub registry: &'a FeedRegistry,
    pub fetcher: FeedFetcher,
    pub writer: ArtifactWriter,
    pub limit: usize,
    pub sink: Option<&'a dyn ArtifactSink>,
    pub reporter: Option<ReportClient>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub target: String,
    pub path: PathBuf,
    pub count: usize,
    /// `None` when no remote sink was configured.
    pub remote: Option<Result<UpsertAction, UpsertError>>,
    /// `None` when no report endpoint was configured.
    pub reported: Option<bool>,
}

/// Exit status when the remote lookup failed after the local write succeeded.
pub const EXIT_REMOTE_LOOKUP_FAILED: u8 = 2;

impl RunOutcome {
    /// `0` unless the remote lookup failed for a reason other than "absent".
    ///
    /// Write-phase remote failures and report failures stay at `0`.
    pub fn exit_code(&self) -> u8 {
        match &self.remote {
            Some(Err(e)) if e.is_lookup() => EXIT_REMOTE_LOOKUP_FAILED,
            _ => 0,
        }
    }

    pub fn remote_error(&self) -> Option<&UpsertError> {
        self.remote.as_ref().and_then(|r| r.as_ref().err())
    }
}

impl<'a> Collector<'a> {
    /// Run against today's local date.
    pub async fn run(&self, requested: Option<&str>) -> Result<RunOutcome, CollectError> {
        self.run_on(requested, Local::now().date_naive()).await
    }

    /// The local artifact is the only hard requirement; sink and report failures
    /// are logged and recorded in the outcome.
    pub async fn run_on(
        &self,
        requested: Option<&str>,
        date: NaiveDate,
    ) -> Result<RunOutcome, CollectError> {
        let target = self.registry.resolve(requested.unwrap_or_default())?;

        let items = self.fetcher.fetch(&target.url, self.limit).await?;
        let path = self.writer.write(&target.id, date, &items)?;
        tracing::info!(target_id = %target.id, count = items.len(), path = %path.display(), "collected");

        let remote = match self.sink {
            Some(sink) => {
                let remote_path = artifact_path(date, &target.id);
                let res = upsert_remote(sink, &remote_path, &items).await;
                if let Err(e) = &res {
                    tracing::error!(error = %e, path = %remote_path, "remote upsert failed");
                }
                Some(res)
            }
            None => None,
        };

        let reported = match &self.reporter {
            Some(r) => Some(r.send_best_effort(&target.id, items.len() as u64).await),
            None => None,
        };

        Ok(RunOutcome {
            target: target.id,
            path,
            count: items.len(),
            remote,
            reported,
        })
    }
}
