use std::{error::Error as StdError, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Raised while building a provider, before any request is sent.
    #[error("Embedding configuration invalid: {0}")]
    InvalidConfig(String),
    #[error("Embedding invalid response: {0}")]
    InvalidResponse(String),
    #[error("Embedding rate limited (retry_after={})", fmt_retry_after(.retry_after))]
    RateLimited { retry_after: Option<Duration> },
    #[error("Embedding timeout after {0:?}")]
    Timeout(Duration),
    #[error("Embedding provider error: {0}")]
    Provider(String),
    #[error("Embedding error: {0}")]
    Other(#[source] Box<dyn StdError + Send + Sync>),
}

fn fmt_retry_after(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(duration) => format!("{duration:?}"),
        None => "unknown".to_string(),
    }
}
