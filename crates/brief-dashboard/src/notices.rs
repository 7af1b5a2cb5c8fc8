use brief_orchestrator::{
    FailureNotice, IngestError, PipelineState, ProgressUpdate, FILE_TOO_LARGE_DESCRIPTION,
    FILE_TOO_LARGE_TITLE,
};
use brief_storage::StorageConfigError;

const PROGRESS_BAR_WIDTH: usize = 20;

/// One progress line, e.g. `[####----------------]  20% Embedding document...`.
pub fn render_progress(update: &ProgressUpdate) -> String {
    let filled = usize::from(update.progress.min(100)) * PROGRESS_BAR_WIDTH / 100;
    let label = match update.state {
        PipelineState::Completed => "Analysis complete.",
        PipelineState::Failed { .. } => "Analysis stopped.",
        state => state.label().unwrap_or("Finalizing..."),
    };
    format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        update.progress,
        label
    )
}

pub fn render_failure(notice: &FailureNotice) -> String {
    format!(
        "{}\n{}\n(stage: {}, kind: {}, detail: {})",
        notice.title, notice.description, notice.stage, notice.kind, notice.detail
    )
}

/// Title and description for a document the ingestor refused.
pub fn render_ingest_rejection(error: &IngestError) -> String {
    match error {
        IngestError::TooLarge { .. } => {
            format!("{FILE_TOO_LARGE_TITLE}\n{FILE_TOO_LARGE_DESCRIPTION}")
        }
        other => format!("Document rejected\n{other}"),
    }
}

pub fn render_config_banner(error: &StorageConfigError) -> String {
    let banner = error.banner();
    let width = banner
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    let rule = "=".repeat(width);
    format!("{rule}\n{banner}\n{rule}")
}
