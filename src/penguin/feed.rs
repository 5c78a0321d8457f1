use std::time::Duration;

use async_trait::async_trait;

use super::DropMatrix;
use crate::error::SenseiError;

/// Penguin Statistics global drop matrix.
pub const DEFAULT_PENGUIN_URL: &str = "https://penguin-stats.io/PenguinStats/api/v2/result/matrix";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Source of the drop matrix.
#[async_trait]
pub trait DropFeed: Send + Sync {
    async fn fetch(&self) -> Result<DropMatrix, SenseiError>;
}

/// Fetches the matrix over HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpDropFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpDropFeed {
    pub fn new(url: impl Into<String>) -> Result<Self, SenseiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("material-sensei/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DropFeed for HttpDropFeed {
    async fn fetch(&self) -> Result<DropMatrix, SenseiError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SenseiError::FeedStatus(status.as_u16()));
        }
        // Malformed bodies map to `SenseiError::JsonParse`, not `Http`.
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// A feed that always serves the same matrix, e.g. a matrix exported from
/// Penguin Statistics for offline use.
#[derive(Debug, Clone, Default)]
pub struct StaticDropFeed {
    matrix: DropMatrix,
}

impl StaticDropFeed {
    pub fn new(matrix: DropMatrix) -> Self {
        Self { matrix }
    }

    /// Read a matrix saved as JSON on disk.
    pub fn from_file(path: &std::path::Path) -> Result<Self, SenseiError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&raw)?))
    }
}

#[async_trait]
impl DropFeed for StaticDropFeed {
    async fn fetch(&self) -> Result<DropMatrix, SenseiError> {
        Ok(self.matrix.clone())
    }
}
