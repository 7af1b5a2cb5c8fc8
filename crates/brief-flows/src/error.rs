use brief_ai::BriefAiError;
use brief_core::{ErrorKind, ServiceError};
use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates supported `FlowError` values.
pub enum FlowError {
    #[error("failed to render {flow} prompt: {source}")]
    Template {
        flow: &'static str,
        #[source]
        source: minijinja::Error,
    },
    #[error("{flow} request failed: {source}")]
    Provider {
        flow: &'static str,
        #[source]
        source: BriefAiError,
    },
    #[error("{flow} returned invalid output: {detail}")]
    InvalidOutput { flow: &'static str, detail: String },
    #[error("invalid flow input: {0}")]
    InvalidInput(String),
    #[error("similar-case index request failed: {0}")]
    IndexTransport(reqwest::Error),
    #[error("similar-case index returned status {status}: {body}")]
    IndexStatus { status: u16, body: String },
}

impl FlowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Template { .. } => ErrorKind::Unknown,
            Self::Provider { source, .. } => source.kind(),
            Self::InvalidOutput { .. } | Self::InvalidInput(_) => ErrorKind::Validation,
            Self::IndexTransport(error) => {
                if error.is_timeout() || error.is_connect() || error.is_request() {
                    ErrorKind::Network
                } else if error.is_decode() {
                    ErrorKind::Validation
                } else {
                    ErrorKind::Unknown
                }
            }
            Self::IndexStatus { status, .. } => ErrorKind::from_http_status(*status),
        }
    }
}

impl From<reqwest::Error> for FlowError {
    fn from(error: reqwest::Error) -> Self {
        Self::IndexTransport(error.without_url())
    }
}

impl From<FlowError> for ServiceError {
    fn from(error: FlowError) -> Self {
        ServiceError::new(error.kind(), error.to_string())
    }
}
