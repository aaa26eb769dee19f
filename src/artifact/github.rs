// src/artifact/github.rs
//! GitHub contents API as an [`ArtifactSink`].

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::artifact::sink::{ArtifactSink, RemoteBlob};
use crate::error::SinkError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BRANCH: &str = "main";

const USER_AGENT: &str = concat!("rss-collector/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct GithubSink {
    client: Client,
    api_url: String,
    repo: String,
    token: String,
    branch: String,
    timeout: Duration,
}

impl std::fmt::Debug for GithubSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubSink")
            .field("api_url", &self.api_url)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token_len", &self.token.len())
            .finish()
    }
}

impl GithubSink {
    /// `repo` is `owner/name`.
    pub fn new(repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
            repo: repo.into(),
            token: token.into(),
            branch: DEFAULT_BRANCH.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_url,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header("X-GitHub-Api-Version", "2022-11-28")
            .timeout(self.timeout)
    }

    async fn put(
        &self,
        path: &str,
        body: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<(), SinkError> {
        let payload = PutContents {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(body.as_bytes()),
            branch: &self.branch,
            sha,
        };
        let resp = self
            .authed(self.client.put(self.contents_url(path)))
            .json(&payload)
            .send()
            .await?;
        match resp.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            status => Err(status_error(status, resp).await),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

async fn status_error(status: StatusCode, resp: reqwest::Response) -> SinkError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return SinkError::Unauthorized(status.as_u16());
    }
    let mut body = resp.text().await.unwrap_or_default();
    body.truncate(512);
    SinkError::Status {
        status: status.as_u16(),
        body,
    }
}

#[async_trait]
impl ArtifactSink for GithubSink {
    async fn lookup(&self, path: &str) -> Result<Option<RemoteBlob>, SinkError> {
        let resp = self
            .authed(self.client.get(self.contents_url(path)))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let raw = resp.text().await?;
                let entry: ContentsEntry = serde_json::from_str(&raw)
                    .map_err(|e| SinkError::Decode(format!("{path} is not a file: {e}")))?;
                Ok(Some(RemoteBlob { sha: entry.sha }))
            }
            s => Err(status_error(s, resp).await),
        }
    }

    async fn create(&self, path: &str, body: &str, message: &str) -> Result<(), SinkError> {
        self.put(path, body, message, None).await
    }

    async fn update(
        &self,
        path: &str,
        body: &str,
        message: &str,
        current: &RemoteBlob,
    ) -> Result<(), SinkError> {
        self.put(path, body, message, Some(&current.sha)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_url_joins_cleanly() {
        let s = GithubSink::new("acme/news", "t").with_api_url("http://localhost:9/");
        assert_eq!(
            s.contents_url("/data/2024-05-01/hk_it.json"),
            "http://localhost:9/repos/acme/news/contents/data/2024-05-01/hk_it.json"
        );
    }

    #[test]
    fn debug_output_hides_token() {
        let s = GithubSink::new("acme/news", "ghp_secret");
        assert!(!format!("{s:?}").contains("ghp_secret"));
    }

    #[test]
    fn create_payload_omits_sha() {
        let p = PutContents {
            message: "m",
            content: "e30=".into(),
            branch: "main",
            sha: None,
        };
        let v = serde_json::to_value(&p).unwrap();
        assert!(v.get("sha").is_none());
        assert_eq!(v["branch"], "main");
    }
}
