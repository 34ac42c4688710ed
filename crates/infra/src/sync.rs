//! Pushing saved tables to a remote repository.
//!
//! After every local commit each written file is uploaded with a short
//! change description. The remote is a GitHub repository reached through the
//! contents API: read the current revision marker (`sha`) of the file, then
//! upload the new content tagged with it. There is no retry; a failed push is
//! reported back to the caller and the local files stay as written.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Destination for saved table contents.
pub trait RemoteSync {
    /// `false` when pushes are skipped entirely (local-only mode).
    fn is_enabled(&self) -> bool {
        true
    }

    /// Create or update `path` on the remote with `content`.
    fn push(&self, path: &str, content: &[u8], message: &str) -> Result<(), SyncError>;
}

impl<S> RemoteSync for Box<S>
where
    S: RemoteSync + ?Sized,
{
    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn push(&self, path: &str, content: &[u8], message: &str) -> Result<(), SyncError> {
        (**self).push(path, content, message)
    }
}

/// Local-only operation: nothing is pushed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl RemoteSync for NoRemote {
    fn is_enabled(&self) -> bool {
        false
    }

    fn push(&self, _path: &str, _content: &[u8], _message: &str) -> Result<(), SyncError> {
        Ok(())
    }
}

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    pub api_url: String,
    /// `owner/name`.
    pub repo: String,
    pub token: String,
    /// Target branch; the repository default when `None`.
    pub branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentMeta {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// GitHub contents API client (blocking).
#[derive(Debug, Clone)]
pub struct GitHubContents {
    config: GitHubConfig,
    client: reqwest::blocking::Client,
}

impl GitHubContents {
    pub fn new(config: GitHubConfig) -> Result<Self, SyncError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("pantry/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::Client(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.repo,
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::blocking::RequestBuilder {
        self.client
            .request(method, self.contents_url(path))
            .header(reqwest::header::AUTHORIZATION, format!("token {}", self.config.token))
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
    }

    /// Current revision marker of `path`, or `None` when the file does not
    /// exist remotely (any non-200 answer).
    fn fetch_sha(&self, path: &str) -> Result<Option<String>, SyncError> {
        let mut req = self.request(reqwest::Method::GET, path);
        if let Some(branch) = &self.config.branch {
            req = req.query(&[("ref", branch)]);
        }
        let resp = req.send().map_err(|e| SyncError::Network(e.to_string()))?;
        if resp.status() != reqwest::StatusCode::OK {
            tracing::debug!(path, status = resp.status().as_u16(), "no remote revision");
            return Ok(None);
        }
        let meta: ContentMeta = resp
            .json()
            .map_err(|e| SyncError::Network(format!("invalid contents response: {e}")))?;
        Ok(Some(meta.sha))
    }
}

impl RemoteSync for GitHubContents {
    fn push(&self, path: &str, content: &[u8], message: &str) -> Result<(), SyncError> {
        let sha = self.fetch_sha(path)?;
        let body = PutContents {
            message,
            content: STANDARD.encode(content),
            sha,
            branch: self.config.branch.as_deref(),
        };
        let resp = self
            .request(reqwest::Method::PUT, path)
            .json(&body)
            .send()
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(SyncError::Api(status.as_u16(), text));
        }
        tracing::info!(path, repo = %self.config.repo, "pushed to remote");
        Ok(())
    }
}

/// Outcome of pushing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Synced,
    /// No remote configured.
    Disabled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSync {
    pub file: String,
    pub status: SyncStatus,
}

/// What a successful mutation did: whether state changed, and how each
/// written file fared remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Receipt {
    pub changed: bool,
    pub files: Vec<FileSync>,
}

impl Receipt {
    pub(crate) fn unchanged() -> Self {
        Self::default()
    }

    /// Files whose push failed, with the reason.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().filter_map(|f| match &f.status {
            SyncStatus::Failed(reason) => Some((f.file.as_str(), reason.as_str())),
            _ => None,
        })
    }

    pub fn is_synced(&self) -> bool {
        self.files.iter().all(|f| f.status == SyncStatus::Synced)
    }
}
