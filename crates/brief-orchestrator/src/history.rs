use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use brief_core::{read_text_optional, write_text_atomic};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Analysis, AnalysisStatus, MemoResult};

const ANALYSIS_HISTORY_SCHEMA_VERSION: u32 = 1;
const ANALYSIS_ID_PREFIX: &str = "case-";

fn analysis_history_schema_version() -> u32 {
    ANALYSIS_HISTORY_SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates supported `HistoryError` values.
pub enum HistoryError {
    #[error("no analysis with id {0}")]
    UnknownAnalysis(String),
    #[error("analysis {id} already finished as {status}")]
    AlreadyFinished { id: String, status: AnalysisStatus },
    #[error("analysis {id} is not yet complete (status {status})")]
    NotReady { id: String, status: AnalysisStatus },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
struct AnalysisHistoryFile {
    #[serde(default = "analysis_history_schema_version")]
    schema_version: u32,
    #[serde(default)]
    analyses: Vec<Analysis>,
    #[serde(default)]
    results: BTreeMap<String, MemoResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Recent analyses, newest first, with the results of the completed ones.
///
/// Status only moves out of `InProgress` once, and a result is stored exactly
/// when the status becomes `Completed`.
pub struct AnalysisHistory {
    analyses: Vec<Analysis>,
    results: BTreeMap<String, MemoResult>,
}

impl AnalysisHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let Some(raw) = read_text_optional(path)? else {
            return Ok(Self::new());
        };
        let file = serde_json::from_str::<AnalysisHistoryFile>(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if file.schema_version != ANALYSIS_HISTORY_SCHEMA_VERSION {
            bail!(
                "unsupported analysis history schema_version {} (expected {})",
                file.schema_version,
                ANALYSIS_HISTORY_SCHEMA_VERSION
            );
        }
        for analysis in &file.analyses {
            let has_result = file.results.contains_key(&analysis.id);
            if (analysis.status == AnalysisStatus::Completed) != has_result {
                bail!(
                    "analysis history {} is inconsistent: {} is {} but {}",
                    path.display(),
                    analysis.id,
                    analysis.status,
                    if has_result {
                        "has a stored result"
                    } else {
                        "has no stored result"
                    }
                );
            }
        }
        if let Some(orphan) = file
            .results
            .keys()
            .find(|id| !file.analyses.iter().any(|analysis| &analysis.id == *id))
        {
            bail!(
                "analysis history {} has a result for unknown analysis {orphan}",
                path.display()
            );
        }
        Ok(Self {
            analyses: file.analyses,
            results: file.results,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = AnalysisHistoryFile {
            schema_version: ANALYSIS_HISTORY_SCHEMA_VERSION,
            analyses: self.analyses.clone(),
            results: self.results.clone(),
        };
        let rendered = serde_json::to_string_pretty(&file).context("serialize analysis history")?;
        write_text_atomic(path, &rendered)
    }

    /// Analyses in display order, newest first.
    pub fn analyses(&self) -> &[Analysis] {
        &self.analyses
    }

    pub fn get(&self, id: &str) -> Option<&Analysis> {
        self.analyses.iter().find(|analysis| analysis.id == id)
    }

    /// Next `case-NNN` id, one past the highest numeric suffix in use.
    pub fn next_id(&self) -> String {
        let next = self
            .analyses
            .iter()
            .filter_map(|analysis| analysis.id.strip_prefix(ANALYSIS_ID_PREFIX))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .map_or(1, |highest| highest.saturating_add(1));
        format!("{ANALYSIS_ID_PREFIX}{next:03}")
    }

    /// Records a new in-progress analysis at the front of the list.
    pub fn start_analysis(&mut self, case_name: &str, date: &str) -> Analysis {
        let analysis = Analysis {
            id: self.next_id(),
            case_name: case_name.to_string(),
            date: date.to_string(),
            status: AnalysisStatus::InProgress,
        };
        self.analyses.insert(0, analysis.clone());
        analysis
    }

    pub fn complete(&mut self, id: &str, result: MemoResult) -> Result<&Analysis, HistoryError> {
        let analysis = self.unfinished_mut(id)?;
        analysis.status = AnalysisStatus::Completed;
        self.results.insert(id.to_string(), result);
        self.get(id)
            .ok_or_else(|| HistoryError::UnknownAnalysis(id.to_string()))
    }

    pub fn fail(&mut self, id: &str) -> Result<&Analysis, HistoryError> {
        let analysis = self.unfinished_mut(id)?;
        analysis.status = AnalysisStatus::Failed;
        Ok(analysis)
    }

    /// The stored result, available only once the analysis has completed.
    pub fn result_for(&self, id: &str) -> Result<&MemoResult, HistoryError> {
        let analysis = self
            .get(id)
            .ok_or_else(|| HistoryError::UnknownAnalysis(id.to_string()))?;
        if analysis.status != AnalysisStatus::Completed {
            return Err(HistoryError::NotReady {
                id: id.to_string(),
                status: analysis.status,
            });
        }
        self.results.get(id).ok_or(HistoryError::NotReady {
            id: id.to_string(),
            status: analysis.status,
        })
    }

    fn unfinished_mut(&mut self, id: &str) -> Result<&mut Analysis, HistoryError> {
        let analysis = self
            .analyses
            .iter_mut()
            .find(|analysis| analysis.id == id)
            .ok_or_else(|| HistoryError::UnknownAnalysis(id.to_string()))?;
        if analysis.status.is_finished() {
            return Err(HistoryError::AlreadyFinished {
                id: id.to_string(),
                status: analysis.status,
            });
        }
        Ok(analysis)
    }
}
