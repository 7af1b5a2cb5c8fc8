use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use brief_ai::{GoogleClient, GoogleConfig, LlmClient};
use brief_cli::Cli;
use brief_flows::{FixtureRetriever, SimilarCaseRetriever, VectorIndexRetriever};
use brief_orchestrator::{AnalysisHistory, OrchestratorConfig};
use brief_storage::{FirebaseStorageClient, ObjectStore, StorageConfig, StorageConfigError};

pub(crate) fn google_config(cli: &Cli) -> Result<GoogleConfig> {
    let api_key = cli
        .google_api_key
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("GOOGLE_API_KEY is not set; export it or pass --google-api-key"))?;
    Ok(GoogleConfig {
        api_base: cli.google_api_base.clone(),
        api_key: api_key.to_string(),
        request_timeout_ms: cli.request_timeout_ms,
        max_retries: cli.provider_max_retries,
        retry_budget_ms: cli.request_timeout_ms,
    })
}

pub(crate) fn build_llm_client(cli: &Cli) -> Result<Arc<dyn LlmClient>> {
    let client = GoogleClient::new(google_config(cli)?).context("failed to build Gemini client")?;
    Ok(Arc::new(client))
}

pub(crate) fn storage_config(cli: &Cli) -> Result<StorageConfig, StorageConfigError> {
    StorageConfig::from_values(
        cli.firebase_api_key.as_deref(),
        cli.firebase_project_id.as_deref(),
        cli.firebase_storage_bucket.as_deref(),
        cli.firebase_storage_api_base.as_deref(),
    )
}

pub(crate) fn build_object_store(
    config: StorageConfig,
    request_timeout_ms: u64,
) -> Result<Arc<dyn ObjectStore>> {
    let client = FirebaseStorageClient::new(config, request_timeout_ms)
        .context("failed to build Firebase Storage client")?;
    Ok(Arc::new(client))
}

/// The HTTP index when one is configured, otherwise the built-in fixture cases.
pub(crate) fn build_retriever(cli: &Cli) -> Result<Arc<dyn SimilarCaseRetriever>> {
    match cli.vector_index_url.as_deref() {
        Some(endpoint) => {
            let retriever = VectorIndexRetriever::new(endpoint, cli.request_timeout_ms)
                .context("failed to build vector index client")?;
            tracing::debug!(endpoint, "using vector index retriever");
            Ok(Arc::new(retriever))
        }
        None => {
            tracing::debug!("using fixture similar-case retriever");
            Ok(Arc::new(FixtureRetriever::default()))
        }
    }
}

pub(crate) fn orchestrator_config(cli: &Cli) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::new(cli.model.clone());
    config.embed_source = cli.embed_from.into();
    config.top_k = cli.top_k;
    config
}

pub(crate) fn load_shared_history(path: &Path) -> Result<Arc<Mutex<AnalysisHistory>>> {
    let history = AnalysisHistory::load(path)
        .with_context(|| format!("failed to load analysis history {}", path.display()))?;
    Ok(Arc::new(Mutex::new(history)))
}

pub(crate) fn save_shared_history(history: &Mutex<AnalysisHistory>, path: &Path) -> Result<()> {
    let snapshot = match history.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    snapshot
        .save(path)
        .with_context(|| format!("failed to save analysis history {}", path.display()))
}
