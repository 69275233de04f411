use std::path::PathBuf;

use reqwest::StatusCode;
use shared::domain::ChatData;
use thiserror::Error;
use tracing::info;
use url::Url;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("fixture request failed with status {status}")]
    Http { status: StatusCode },
    #[error("fixture request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("fixture body is not valid chat data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read fixture: {0}")]
    Io(#[from] std::io::Error),
}

/// Load status presented to the view layer. One attempt, no retry.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Failed(String),
    Ready(ChatData),
}

impl LoadState {
    pub fn data(&self) -> Option<&ChatData> {
        match self {
            LoadState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_))
    }
}

#[derive(Debug, Clone)]
enum FixtureSource {
    Url(Url),
    Path(PathBuf),
}

/// One-shot loader for the static chat fixture, from either a served url or
/// a local file.
#[derive(Debug, Clone)]
pub struct FixtureLoader {
    http: reqwest::Client,
    source: FixtureSource,
}

impl FixtureLoader {
    pub fn from_url(url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            source: FixtureSource::Url(url),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            source: FixtureSource::Path(path.into()),
        }
    }

    pub async fn load(&self) -> Result<ChatData, LoadError> {
        let body = match &self.source {
            FixtureSource::Url(url) => {
                info!(url = %url, "fetching chat fixture");
                let response = self.http.get(url.clone()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::Http { status });
                }
                response.text().await?
            }
            FixtureSource::Path(path) => {
                info!(path = %path.display(), "reading chat fixture");
                tokio::fs::read_to_string(path).await?
            }
        };
        Ok(serde_json::from_str(&body)?)
    }
}
