use brief_core::{ErrorKind, ServiceError};
use serde::Serialize;

use crate::PipelineState;

pub const ANALYSIS_FAILED_TITLE: &str = "Analysis Failed";
pub const UPLOAD_PERMISSION_MESSAGE: &str = "Upload failed: Permission denied. Please check your Firebase Storage security rules in the Firebase Console to ensure you have write access.";
pub const UPLOAD_NOT_FOUND_MESSAGE: &str = "Upload failed: The file could not be found after upload.";
pub const NETWORK_MESSAGE: &str =
    "A network error occurred. Please check your internet connection and try again.";
pub const DEFAULT_FAILURE_MESSAGE: &str = "An unexpected error occurred during the analysis.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// User-facing explanation of a failed run.
pub struct FailureNotice {
    pub title: &'static str,
    pub description: &'static str,
    pub kind: ErrorKind,
    pub stage: &'static str,
    pub detail: String,
}

/// Maps a tagged failure from `stage` onto the notice shown to the user.
///
/// Permission and not-found notices describe storage problems, so they are
/// only used for failures raised while uploading.
pub fn classify_failure(stage: PipelineState, error: &ServiceError) -> FailureNotice {
    let uploading = stage == PipelineState::Uploading;
    let description = match error.kind {
        ErrorKind::Permission if uploading => UPLOAD_PERMISSION_MESSAGE,
        ErrorKind::NotFound if uploading => UPLOAD_NOT_FOUND_MESSAGE,
        ErrorKind::Network => NETWORK_MESSAGE,
        _ => DEFAULT_FAILURE_MESSAGE,
    };
    FailureNotice {
        title: ANALYSIS_FAILED_TITLE,
        description,
        kind: error.kind,
        stage: stage.as_str(),
        detail: error.detail.clone(),
    }
}
