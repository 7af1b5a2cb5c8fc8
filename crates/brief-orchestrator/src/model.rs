use brief_flows::{PreliminaryMemoOutput, SimilarCase};
use serde::{Deserialize, Serialize};

pub const PRELIMINARY_MEMO_SECTION_TITLE: &str = "Preliminary Memorandum";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// Enumerates supported `AnalysisStatus` values.
pub enum AnalysisStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// One entry in the recent-analyses list.
pub struct Analysis {
    pub id: String,
    pub case_name: String,
    pub date: String,
    pub status: AnalysisStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoSection {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoDocument {
    pub title: String,
    pub sections: Vec<MemoSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentifiedLaw {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// The structured outcome of a completed analysis.
pub struct MemoResult {
    pub memo: MemoDocument,
    pub summary: String,
    pub identified_laws: Vec<IdentifiedLaw>,
    pub similar_cases: Vec<SimilarCase>,
}

impl MemoResult {
    pub fn from_draft(
        file_name: &str,
        draft: PreliminaryMemoOutput,
        similar_cases: Vec<SimilarCase>,
    ) -> Self {
        Self {
            memo: MemoDocument {
                title: format!("Preliminary Memo for {file_name}"),
                sections: vec![MemoSection {
                    title: PRELIMINARY_MEMO_SECTION_TITLE.to_string(),
                    content: draft.preliminary_memo,
                }],
            },
            summary: draft.summary,
            identified_laws: draft
                .identified_laws
                .into_iter()
                .map(|name| IdentifiedLaw { name })
                .collect(),
            similar_cases,
        }
    }
}
