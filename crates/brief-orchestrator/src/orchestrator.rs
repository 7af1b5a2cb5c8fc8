use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use brief_ai::LlmClient;
use brief_core::{current_date_string, current_unix_timestamp_ms, ErrorKind, ServiceError};
use brief_flows::{
    generate_document_embedding, generate_preliminary_memo, summarize_for_prompt,
    DocumentReference, PreliminaryMemoInput, SimilarCaseRetriever, DEFAULT_TOP_K,
};
use brief_storage::{object_key, ObjectStore};
use serde::Serialize;
use thiserror::Error;

use crate::{
    classify_failure, Analysis, AnalysisHistory, DocumentIngestor, FailureNotice, IngestError,
    IngestedDocument, MemoResult, PipelineEffect, PipelineEvent, PipelineMachine, PipelineState,
    TransitionError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Which document reference the embedding stage hands to the provider.
pub enum EmbedSource {
    #[default]
    DataUri,
    StorageUrl,
}

impl EmbedSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DataUri => "data-uri",
            Self::StorageUrl => "storage-url",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `OrchestratorConfig` used to build an [`AnalysisOrchestrator`].
pub struct OrchestratorConfig {
    pub model: String,
    pub embed_source: EmbedSource,
    pub top_k: usize,
}

impl OrchestratorConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            embed_source: EmbedSource::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Snapshot published to progress subscribers after every transition.
pub struct ProgressUpdate {
    pub analysis_id: String,
    pub state: PipelineState,
    pub stage_index: Option<usize>,
    pub label: Option<&'static str>,
    pub progress: u8,
}

pub type ProgressHandler = Arc<dyn Fn(&ProgressUpdate) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// How a run ended.
pub enum AnalysisOutcome {
    Completed {
        analysis: Analysis,
        result: MemoResult,
    },
    Failed {
        analysis: Analysis,
        notice: FailureNotice,
    },
}

impl AnalysisOutcome {
    pub fn analysis(&self) -> &Analysis {
        match self {
            Self::Completed { analysis, .. } | Self::Failed { analysis, .. } => analysis,
        }
    }
}

#[derive(Debug, Error)]
/// Errors that prevent a run from starting or leave it in an illegal state.
pub enum AnalyzeError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Drives one document through upload, embedding, retrieval, and drafting.
///
/// Collaborators are injected; runs are sequential and never retried.
pub struct AnalysisOrchestrator {
    store: Arc<dyn ObjectStore>,
    llm: Arc<dyn LlmClient>,
    retriever: Arc<dyn SimilarCaseRetriever>,
    history: Arc<Mutex<AnalysisHistory>>,
    config: OrchestratorConfig,
    handlers: Vec<ProgressHandler>,
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl AnalysisOrchestrator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        llm: Arc<dyn LlmClient>,
        retriever: Arc<dyn SimilarCaseRetriever>,
        history: Arc<Mutex<AnalysisHistory>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            llm,
            retriever,
            history,
            config,
            handlers: Vec::new(),
        }
    }

    /// Adds a subscriber that receives every progress update.
    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&ProgressUpdate) + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
    }

    pub fn history(&self) -> Arc<Mutex<AnalysisHistory>> {
        Arc::clone(&self.history)
    }

    /// Ingests `path` and runs the pipeline. Rejected documents never start a run.
    pub async fn analyze_path(
        &self,
        ingestor: &DocumentIngestor,
        path: &Path,
        user_instructions: Option<String>,
    ) -> Result<AnalysisOutcome, AnalyzeError> {
        let document = ingestor.ingest(path).await?;
        self.analyze(&document, user_instructions).await
    }

    #[tracing::instrument(
        level = "info",
        skip(self, document, user_instructions),
        fields(file = document.file_name.as_str(), bytes = document.bytes.len())
    )]
    pub async fn analyze(
        &self,
        document: &IngestedDocument,
        user_instructions: Option<String>,
    ) -> Result<AnalysisOutcome, AnalyzeError> {
        let analysis =
            lock_or_recover(&self.history).start_analysis(&document.file_name, &current_date_string());
        let mut machine = PipelineMachine::new();
        machine.apply(PipelineEvent::Start)?;
        self.emit(&analysis.id, &machine);
        tracing::info!(analysis = analysis.id.as_str(), "analysis started");

        match self
            .run_stages(&analysis, document, user_instructions, &mut machine)
            .await
        {
            Ok(result) => {
                let effect = machine.apply(PipelineEvent::StageCompleted)?;
                debug_assert_eq!(effect, PipelineEffect::Complete);
                self.emit(&analysis.id, &machine);
                let analysis = self.current(&analysis);
                tracing::info!(analysis = analysis.id.as_str(), "analysis completed");
                Ok(AnalysisOutcome::Completed { analysis, result })
            }
            Err(error) => {
                let failed_stage = machine.state();
                machine.apply(PipelineEvent::StageFailed { kind: error.kind })?;
                if let Err(history_error) = lock_or_recover(&self.history).fail(&analysis.id) {
                    tracing::warn!(%history_error, "could not mark analysis failed");
                }
                self.emit(&analysis.id, &machine);
                let notice = classify_failure(failed_stage, &error);
                tracing::warn!(
                    analysis = analysis.id.as_str(),
                    stage = failed_stage.as_str(),
                    kind = error.kind.as_str(),
                    detail = error.detail.as_str(),
                    "analysis failed"
                );
                Ok(AnalysisOutcome::Failed {
                    analysis: self.current(&analysis),
                    notice,
                })
            }
        }
    }

    async fn run_stages(
        &self,
        analysis: &Analysis,
        document: &IngestedDocument,
        user_instructions: Option<String>,
        machine: &mut PipelineMachine,
    ) -> Result<MemoResult, ServiceError> {
        let key = object_key(&document.file_name, current_unix_timestamp_ms());
        let stored = self
            .store
            .upload(&key, &document.bytes, &document.mime_type)
            .await?;
        tracing::debug!(key = stored.key.as_str(), "document uploaded");
        self.advance(&analysis.id, machine)?;

        let reference = match self.config.embed_source {
            EmbedSource::DataUri => DocumentReference::DocumentDataUri(document.data_uri()),
            EmbedSource::StorageUrl => DocumentReference::DocumentUrl {
                url: stored.url,
                mime_type: document.mime_type.clone(),
            },
        };
        let embedding =
            generate_document_embedding(self.llm.as_ref(), &self.config.model, &reference).await?;
        self.advance(&analysis.id, machine)?;

        let similar_cases = self
            .retriever
            .retrieve(&embedding.embedding, self.config.top_k)
            .await?;
        self.advance(&analysis.id, machine)?;

        let input = PreliminaryMemoInput::new(
            document.text(),
            summarize_for_prompt(&similar_cases),
            user_instructions,
        );
        let draft =
            generate_preliminary_memo(self.llm.as_ref(), &self.config.model, &input).await?;
        self.advance(&analysis.id, machine)?;

        let result = MemoResult::from_draft(&document.file_name, draft, similar_cases);
        lock_or_recover(&self.history)
            .complete(&analysis.id, result.clone())
            .map_err(|error| ServiceError::new(ErrorKind::Unknown, error.to_string()))?;
        Ok(result)
    }

    fn advance(&self, analysis_id: &str, machine: &mut PipelineMachine) -> Result<(), ServiceError> {
        machine
            .apply(PipelineEvent::StageCompleted)
            .map_err(|error| ServiceError::new(ErrorKind::Unknown, error.to_string()))?;
        self.emit(analysis_id, machine);
        Ok(())
    }

    fn current(&self, analysis: &Analysis) -> Analysis {
        lock_or_recover(&self.history)
            .get(&analysis.id)
            .cloned()
            .unwrap_or_else(|| analysis.clone())
    }

    fn emit(&self, analysis_id: &str, machine: &PipelineMachine) {
        let state = machine.state();
        let update = ProgressUpdate {
            analysis_id: analysis_id.to_string(),
            state,
            stage_index: state.stage_index(),
            label: state.label(),
            progress: machine.progress(),
        };
        tracing::debug!(
            analysis = analysis_id,
            state = state.as_str(),
            progress = update.progress,
            "pipeline progress"
        );
        for handler in &self.handlers {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(&update)));
        }
    }
}
