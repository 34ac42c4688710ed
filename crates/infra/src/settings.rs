//! Runtime configuration.

use std::path::PathBuf;

use crate::error::SyncError;
use crate::store::FileStore;
use crate::sync::{DEFAULT_GITHUB_API, GitHubConfig, GitHubContents, NoRemote, RemoteSync};

/// Where tables live and where they are pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: PathBuf,
    /// `None` runs local-only.
    pub github: Option<GitHubConfig>,
}

impl Settings {
    /// Build settings from optional values (typically flags or environment).
    ///
    /// The remote is enabled only when both a token and a repository are
    /// given; blank values count as absent.
    pub fn resolve(
        data_dir: Option<PathBuf>,
        token: Option<String>,
        repo: Option<String>,
        api_url: Option<String>,
        branch: Option<String>,
    ) -> Self {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let github = match (non_blank(token), non_blank(repo)) {
            (Some(token), Some(repo)) => Some(GitHubConfig {
                api_url: non_blank(api_url).unwrap_or_else(|| DEFAULT_GITHUB_API.to_string()),
                repo,
                token,
                branch: non_blank(branch),
            }),
            (token, repo) => {
                if token.is_some() || repo.is_some() {
                    tracing::warn!("remote sync needs both a token and a repository; running local-only");
                }
                None
            }
        };
        Self {
            data_dir: data_dir.unwrap_or_else(default_data_dir),
            github,
        }
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(self.data_dir.clone())
    }

    /// The configured remote, or `NoRemote`.
    pub fn remote(&self) -> Result<Box<dyn RemoteSync>, SyncError> {
        match &self.github {
            Some(config) => Ok(Box::new(GitHubContents::new(config.clone())?)),
            None => Ok(Box::new(NoRemote)),
        }
    }
}

/// `<platform data dir>/pantry`, or `./pantry-data` when the platform has none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("pantry"))
        .unwrap_or_else(|| PathBuf::from("pantry-data"))
}
