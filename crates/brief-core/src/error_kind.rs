//! Closed failure taxonomy shared by every remote collaborator.
//!
//! Service clients tag their failures at the point they happen; the
//! orchestrator switches on [`ErrorKind`] instead of inspecting messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Enumerates the failure classes surfaced to users.
pub enum ErrorKind {
    Permission,
    NotFound,
    Network,
    Validation,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Permission => "permission",
            Self::NotFound => "not_found",
            Self::Network => "network",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
        }
    }

    /// Best-effort classification for errors that reached us untagged.
    ///
    /// Matches the storage error codes first, then anything mentioning the
    /// network; everything else is `Unknown`.
    pub fn classify_description(description: &str) -> Self {
        let normalized = description.to_ascii_lowercase();
        if normalized.contains("storage/unauthorized") {
            Self::Permission
        } else if normalized.contains("storage/object-not-found") {
            Self::NotFound
        } else if normalized.contains("network") {
            Self::Network
        } else {
            Self::Unknown
        }
    }

    /// Maps an HTTP status from a remote collaborator onto a failure class.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Permission,
            404 => Self::NotFound,
            400 | 422 => Self::Validation,
            408 | 502 | 503 | 504 => Self::Network,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
/// A failure tagged with its class and a human-readable detail.
pub struct ServiceError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Wraps an untagged error, classifying it from its description.
    pub fn from_untagged(description: impl Into<String>) -> Self {
        let detail = description.into();
        Self {
            kind: ErrorKind::classify_description(&detail),
            detail,
        }
    }
}
