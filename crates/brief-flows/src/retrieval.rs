use std::cmp::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::FlowError;

pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A precedent returned by retrieval. Ids are assumed, not checked, unique.
pub struct SimilarCase {
    pub id: String,
    pub name: String,
    pub summary: String,
}

impl SimilarCase {
    pub fn new(id: impl Into<String>, name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            summary: summary.into(),
        }
    }
}

#[async_trait]
/// Trait contract for `SimilarCaseRetriever` behavior.
///
/// Implementations return at most `top_k` cases ordered by similarity,
/// most similar first.
pub trait SimilarCaseRetriever: Send + Sync {
    async fn retrieve(
        &self,
        embedding: &[f64],
        top_k: usize,
    ) -> Result<Vec<SimilarCase>, FlowError>;
}

/// Renders cases the way the drafting prompt expects them.
pub fn summarize_for_prompt(cases: &[SimilarCase]) -> Vec<String> {
    cases
        .iter()
        .map(|case| format!("{}: {}", case.name, case.summary))
        .collect()
}

pub fn default_fixture_cases() -> Vec<SimilarCase> {
    vec![
        SimilarCase::new(
            "sc-01",
            "DataFlow Inc. v. Syncer (2019)",
            "Established a broad interpretation for claims related to real-time data synchronization technologies, favoring the patent holder.",
        ),
        SimilarCase::new(
            "sc-02",
            "Tectron Corp. v. InfoSys (2021)",
            "Lowered the evidentiary standard for proving access to trade secrets in cases involving the hiring of a competitor's former employees.",
        ),
        SimilarCase::new(
            "sc-03",
            "Connective v. NetLink (2018)",
            "A case where the court ruled against the plaintiff due to overly broad and non-specific patent claims, highlighting the importance of clear claim construction.",
        ),
        SimilarCase::new(
            "sc-04",
            "ByteCorp v. LogicWare (2020)",
            "This case addressed the \"doctrine of equivalents\" in software patent law, providing a framework for how functionally similar but non-identical code can still be found to be infringing.",
        ),
    ]
}

#[derive(Debug, Clone)]
/// Returns a fixed, pre-ranked case list regardless of the embedding.
pub struct FixtureRetriever {
    cases: Vec<SimilarCase>,
}

impl FixtureRetriever {
    pub fn new(cases: Vec<SimilarCase>) -> Self {
        Self { cases }
    }
}

impl Default for FixtureRetriever {
    fn default() -> Self {
        Self::new(default_fixture_cases())
    }
}

#[async_trait]
impl SimilarCaseRetriever for FixtureRetriever {
    async fn retrieve(
        &self,
        _embedding: &[f64],
        top_k: usize,
    ) -> Result<Vec<SimilarCase>, FlowError> {
        Ok(self.cases.iter().take(top_k).cloned().collect())
    }
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(default)]
    neighbors: Vec<IndexNeighbor>,
}

#[derive(Debug, Deserialize)]
struct IndexNeighbor {
    id: String,
    name: String,
    summary: String,
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Clone)]
/// Nearest-neighbour lookup against an HTTP vector index.
pub struct VectorIndexRetriever {
    client: reqwest::Client,
    endpoint: String,
}

impl VectorIndexRetriever {
    pub fn new(endpoint: impl Into<String>, request_timeout_ms: u64) -> Result<Self, FlowError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SimilarCaseRetriever for VectorIndexRetriever {
    async fn retrieve(
        &self,
        embedding: &[f64],
        top_k: usize,
    ) -> Result<Vec<SimilarCase>, FlowError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "vector": embedding, "topK": top_k }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FlowError::IndexStatus {
                status: status.as_u16(),
                body,
            });
        }

        let mut neighbors = response.json::<IndexResponse>().await?.neighbors;
        // Stable sort: equal scores keep the order the index returned.
        neighbors.sort_by(|left, right| {
            right
                .score
                .partial_cmp(&left.score)
                .unwrap_or(Ordering::Equal)
        });
        neighbors.truncate(top_k);
        tracing::debug!(returned = neighbors.len(), top_k, "similar cases retrieved");

        Ok(neighbors
            .into_iter()
            .map(|neighbor| SimilarCase {
                id: neighbor.id,
                name: neighbor.name,
                summary: neighbor.summary,
            })
            .collect())
    }
}
