use brief_flows::SimilarCase;
use brief_orchestrator::{Analysis, AnalysisHistory, AnalysisStatus, HistoryError, MemoResult};
use thiserror::Error;

pub const ANALYSIS_NOT_READY_TITLE: &str = "Analysis Not Ready";
pub const ANALYSIS_NOT_READY_DESCRIPTION: &str = "This analysis is not yet complete.";
pub const NO_CASES_FOUND: &str = "No cases found.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates supported `ViewError` values.
pub enum ViewError {
    #[error("no analysis with id {0}")]
    UnknownAnalysis(String),
    #[error("Analysis Not Ready: This analysis is not yet complete. ({id} is {status})")]
    NotReady { id: String, status: AnalysisStatus },
}

impl From<HistoryError> for ViewError {
    fn from(error: HistoryError) -> Self {
        match error {
            HistoryError::UnknownAnalysis(id) => Self::UnknownAnalysis(id),
            HistoryError::NotReady { id, status } | HistoryError::AlreadyFinished { id, status } => {
                Self::NotReady { id, status }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A completed analysis opened in the dashboard.
pub struct ResultView<'a> {
    pub analysis: &'a Analysis,
    pub result: &'a MemoResult,
    pub search_term: String,
    /// Similar cases after `search_term` is applied.
    pub similar_cases: Vec<SimilarCase>,
}

impl<'a> ResultView<'a> {
    /// Re-filters the retrieved cases; the stored result is never touched.
    pub fn search(mut self, term: &str) -> Self {
        self.search_term = term.to_string();
        self.similar_cases = filter_similar_cases(&self.result.similar_cases, term);
        self
    }
}

/// Opens `id` for display. Only completed analyses expose a result.
pub fn view<'a>(history: &'a AnalysisHistory, id: &str) -> Result<ResultView<'a>, ViewError> {
    let analysis = history
        .get(id)
        .ok_or_else(|| ViewError::UnknownAnalysis(id.to_string()))?;
    let result = history.result_for(id)?;
    Ok(ResultView {
        analysis,
        result,
        search_term: String::new(),
        similar_cases: result.similar_cases.clone(),
    })
}

/// Case-insensitive substring match on name or summary; an empty term keeps all.
/// Whitespace in the term is matched literally.
pub fn filter_similar_cases(cases: &[SimilarCase], term: &str) -> Vec<SimilarCase> {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return cases.to_vec();
    }
    cases
        .iter()
        .filter(|case| {
            case.name.to_lowercase().contains(&needle)
                || case.summary.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

pub fn render_result(view: &ResultView<'_>) -> String {
    let result = view.result;
    let mut lines = vec![
        result.memo.title.clone(),
        format!("Generated on {}", view.analysis.date),
        String::new(),
    ];
    for section in &result.memo.sections {
        lines.push(format!("== {} ==", section.title));
        lines.push(section.content.clone());
        lines.push(String::new());
    }

    lines.push("== Summary ==".to_string());
    lines.push(result.summary.clone());
    lines.push(String::new());

    lines.push("== Identified Laws ==".to_string());
    lines.extend(
        result
            .identified_laws
            .iter()
            .map(|law| format!("  - {}", law.name)),
    );
    lines.push(String::new());

    if view.search_term.is_empty() {
        lines.push("== Similar Cases ==".to_string());
    } else {
        lines.push(format!(
            "== Similar Cases (search: {}) ==",
            view.search_term
        ));
    }
    if view.similar_cases.is_empty() {
        lines.push(format!("  {NO_CASES_FOUND}"));
    }
    for case in &view.similar_cases {
        lines.push(format!("  {} [{}]", case.name, case.id));
        lines.push(format!("    {}", case.summary));
    }
    lines.join("\n")
}
