use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification callers can branch on without matching every variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    NotFound,
    External,
}

/// A parameter value the chunking rules refuse.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid value {0} for BY parameter")]
    InvalidBy(String),
    #[error("invalid value {0} for SPLIT parameter")]
    InvalidSplit(String),
    #[error("invalid value {0} for NORMALIZE parameter")]
    InvalidNormalize(String),
    #[error("invalid text chunking MAXIMUM - '{0}'")]
    InvalidMaximum(String),
    #[error("invalid text chunking OVERLAP - '{0}'")]
    InvalidOverlap(String),
    #[error("invalid text chunking SPLIT BY - {0}")]
    InvalidSplitBy(String),
    #[error("chunking engine rejected parameters: {0}")]
    Engine(String),
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("object does not exist: {object}")]
    NotFound {
        object: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to extract text from {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl IngestionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestionError::Configuration(_) => ErrorKind::Configuration,
            IngestionError::Validation(_) => ErrorKind::Validation,
            IngestionError::NotFound { .. } => ErrorKind::NotFound,
            IngestionError::Read { .. }
            | IngestionError::Parse { .. }
            | IngestionError::Database(_) => ErrorKind::External,
        }
    }

    pub(crate) fn not_found(
        object: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        IngestionError::NotFound {
            object: object.into(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return IngestionError::not_found(path.display().to_string(), source);
        }
        IngestionError::Read { path, source }
    }
}

pub type IngestionResult<T> = Result<T, IngestionError>;
