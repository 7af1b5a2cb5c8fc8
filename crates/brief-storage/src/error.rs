use brief_core::{ErrorKind, ServiceError};
use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates supported `StorageError` values.
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Transport(reqwest::Error),
    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("storage returned invalid object metadata: {0}")]
    InvalidMetadata(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(error) if error.is_decode() => ErrorKind::Validation,
            Self::Transport(_) => ErrorKind::Network,
            Self::Status { status, body, .. } => match ErrorKind::from_http_status(*status) {
                ErrorKind::Unknown => ErrorKind::classify_description(body),
                kind => kind,
            },
            Self::InvalidMetadata(_) => ErrorKind::Validation,
            Self::Service(error) => error.kind,
        }
    }
}

impl From<reqwest::Error> for StorageError {
    /// Request URLs carry the API key as a query parameter, so they are dropped.
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.without_url())
    }
}

impl From<StorageError> for ServiceError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Service(error) => error,
            other => ServiceError::new(other.kind(), other.to_string()),
        }
    }
}
