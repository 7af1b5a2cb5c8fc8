//! Dashboard view model for Brief.
//!
//! Renders the recent-analyses table, the status-gated result view with its
//! similar-case search, progress and failure notices, and Markdown exports
//! of finished memos.

pub mod analysis_table;
pub mod export;
pub mod notices;
pub mod result_view;

pub use analysis_table::{recent_analyses, render_recent_analyses, AnalysisRow, StatusBadge};
pub use export::{export_markdown, render_markdown};
pub use notices::{render_config_banner, render_failure, render_ingest_rejection, render_progress};
pub use result_view::{
    filter_similar_cases, render_result, view, ResultView, ViewError, ANALYSIS_NOT_READY_DESCRIPTION,
    ANALYSIS_NOT_READY_TITLE, NO_CASES_FOUND,
};
