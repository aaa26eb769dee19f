// src/artifact/sink.rs
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::artifact::render;
use crate::error::{SinkError, UpsertError};
use crate::ingest::types::Item;

/// What the sink currently holds at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBlob {
    /// Concurrency token the sink wants back on update (git blob sha for GitHub).
    pub sha: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

/// Remote, version-controlled destination for artifacts.
///
/// `lookup` must return `Ok(None)` only for a definite "no such path"; auth and
/// transport failures are `Err` so they can never be mistaken for absence.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn lookup(&self, path: &str) -> Result<Option<RemoteBlob>, SinkError>;

    async fn create(&self, path: &str, body: &str, message: &str) -> Result<(), SinkError>;

    async fn update(
        &self,
        path: &str,
        body: &str,
        message: &str,
        current: &RemoteBlob,
    ) -> Result<(), SinkError>;
}

pub fn commit_message(path: &str) -> String {
    format!("chore(rss): update {path}")
}

/// Create-or-update `path` with the serialized `items`.
///
/// Only a definite "absent" from `lookup` leads to `create`; any lookup failure
/// is returned as [`UpsertError::Lookup`] without writing.
pub async fn upsert_remote<S: ArtifactSink + ?Sized>(
    sink: &S,
    path: &str,
    items: &[Item],
) -> Result<UpsertAction, UpsertError> {
    let body = render(items).map_err(|e| UpsertError::Write(e.into()))?;
    let message = commit_message(path);

    match sink.lookup(path).await.map_err(UpsertError::Lookup)? {
        Some(current) => {
            sink.update(path, &body, &message, &current)
                .await
                .map_err(UpsertError::Write)?;
            tracing::info!(path, "remote artifact updated");
            Ok(UpsertAction::Updated)
        }
        None => {
            sink.create(path, &body, &message)
                .await
                .map_err(UpsertError::Write)?;
            tracing::info!(path, "remote artifact created");
            Ok(UpsertAction::Created)
        }
    }
}

/// In-process sink keyed by path; the token is the SHA-256 of the stored body.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub files: Mutex<BTreeMap<String, (String, String)>>,
    pub commits: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .ok()
            .and_then(|f| f.get(path).map(|(_, b)| b.clone()))
    }

    fn put(&self, path: &str, body: &str, message: &str) {
        let sha = format!("{:x}", Sha256::digest(body.as_bytes()));
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.to_string(), (sha, body.to_string()));
        }
        if let Ok(mut commits) = self.commits.lock() {
            commits.push(message.to_string());
        }
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn lookup(&self, path: &str) -> Result<Option<RemoteBlob>, SinkError> {
        let files = self
            .files
            .lock()
            .map_err(|_| SinkError::Decode("memory sink lock poisoned".into()))?;
        Ok(files.get(path).map(|(sha, _)| RemoteBlob { sha: sha.clone() }))
    }

    async fn create(&self, path: &str, body: &str, message: &str) -> Result<(), SinkError> {
        self.put(path, body, message);
        Ok(())
    }

    async fn update(
        &self,
        path: &str,
        body: &str,
        message: &str,
        current: &RemoteBlob,
    ) -> Result<(), SinkError> {
        let stale = self
            .files
            .lock()
            .map_err(|_| SinkError::Decode("memory sink lock poisoned".into()))?
            .get(path)
            .map_or(true, |(sha, _)| sha != &current.sha);
        if stale {
            return Err(SinkError::Status {
                status: 409,
                body: format!("{path} does not match {}", current.sha),
            });
        }
        self.put(path, body, message);
        Ok(())
    }
}
