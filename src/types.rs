use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item pulled out of a parsed feed. The link doubles as the
/// article's identity everywhere downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub link: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// A persisted marker meaning "this link has been summarized and delivered".
/// At most one record exists per link; records are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub link: String,
    pub title: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    FeedParse(String),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to extract article text from {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("assistant API error: {0}")]
    Assistant(String),

    #[error("summarization run still pending after {checks} status checks")]
    SummarizationTimeout { checks: u32 },

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SummarizerError {
    /// Errors the orchestrator must not swallow. Persistence is assumed
    /// reliable; losing it aborts the process.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SummarizerError::Database(_) | SummarizerError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SummarizerError>;
