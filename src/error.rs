use thiserror::Error;

/// Unified error type for material-sensei operations.
#[derive(Debug, Error)]
pub enum SenseiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Drop feed returned status {0}")]
    FeedStatus(u16),
}
