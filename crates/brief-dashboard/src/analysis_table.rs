use brief_orchestrator::{AnalysisHistory, AnalysisStatus};
use serde::Serialize;

const CASE_NAME_HEADER: &str = "Case Name";
const DATE_HEADER: &str = "Date";
const STATUS_HEADER: &str = "Status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `StatusBadge` values.
pub enum StatusBadge {
    Success,
    Warning,
    Danger,
    Neutral,
}

impl StatusBadge {
    pub fn for_status(status: AnalysisStatus) -> Self {
        match status {
            AnalysisStatus::Completed => Self::Success,
            AnalysisStatus::InProgress => Self::Warning,
            AnalysisStatus::Failed => Self::Danger,
            AnalysisStatus::Pending => Self::Neutral,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Neutral => "neutral",
        }
    }

    fn marker(self) -> char {
        match self {
            Self::Success => '+',
            Self::Warning => '~',
            Self::Danger => '!',
            Self::Neutral => ' ',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// One row of the recent-analyses table.
pub struct AnalysisRow {
    pub id: String,
    pub case_name: String,
    pub date: String,
    pub status: AnalysisStatus,
    pub badge: StatusBadge,
    /// Only completed analyses can be opened.
    pub viewable: bool,
}

/// Rows in display order, newest first.
pub fn recent_analyses(history: &AnalysisHistory) -> Vec<AnalysisRow> {
    history
        .analyses()
        .iter()
        .map(|analysis| AnalysisRow {
            id: analysis.id.clone(),
            case_name: analysis.case_name.clone(),
            date: analysis.date.clone(),
            status: analysis.status,
            badge: StatusBadge::for_status(analysis.status),
            viewable: analysis.status == AnalysisStatus::Completed,
        })
        .collect()
}

pub fn render_recent_analyses(rows: &[AnalysisRow]) -> String {
    if rows.is_empty() {
        return "Recent Analyses\n  no analyses yet; run `brief analyze <file>` to start one"
            .to_string();
    }

    let id_width = rows.iter().map(|row| row.id.len()).max().unwrap_or(0);
    let name_width = rows
        .iter()
        .map(|row| row.case_name.chars().count())
        .chain(std::iter::once(CASE_NAME_HEADER.len()))
        .max()
        .unwrap_or(CASE_NAME_HEADER.len());
    let date_width = rows
        .iter()
        .map(|row| row.date.len())
        .chain(std::iter::once(DATE_HEADER.len()))
        .max()
        .unwrap_or(DATE_HEADER.len());

    let mut lines = vec![
        "Recent Analyses".to_string(),
        format!(
            "  {:<id_width$}  {:<name_width$}  {:<date_width$}  {}",
            "", CASE_NAME_HEADER, DATE_HEADER, STATUS_HEADER
        ),
    ];
    for row in rows {
        let action = if row.viewable {
            format!("  (brief view {})", row.id)
        } else {
            String::new()
        };
        lines.push(format!(
            "  {:<id_width$}  {:<name_width$}  {:<date_width$}  [{}] {}{}",
            row.id,
            row.case_name,
            row.date,
            row.badge.marker(),
            row.status,
            action
        ));
    }
    lines.join("\n")
}
