use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use brief_ai::{BriefAiError, ChatRequest, ChatResponse, ChatUsage, ContentBlock, LlmClient, MediaSource, Message};
use brief_core::{ErrorKind, ServiceError};
use brief_flows::FixtureRetriever;
use brief_orchestrator::{
    AnalysisHistory, AnalysisOrchestrator, AnalysisOutcome, AnalysisStatus, AnalyzeError,
    DocumentIngestor, EmbedSource, HistoryError, IngestError, IngestedDocument,
    OrchestratorConfig, PipelineState, ProgressUpdate, DEFAULT_FAILURE_MESSAGE,
    MAX_DOCUMENT_BYTES, UPLOAD_PERMISSION_MESSAGE,
};
use brief_storage::InMemoryObjectStore;

const EMBEDDING_REPLY: &str = r#"{"embedding":[0.12,0.34,0.56]}"#;
const MEMO_REPLY: &str = r#"{"preliminaryMemo":"M","identifiedLaws":["L1","L2"],"summary":"S"}"#;

struct ScriptedClient {
    replies: tokio::sync::Mutex<VecDeque<String>>,
    requests: tokio::sync::Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: tokio::sync::Mutex::new(replies.iter().map(|reply| reply.to_string()).collect()),
            requests: tokio::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BriefAiError> {
        self.requests.lock().await.push(request);
        let reply = self.replies.lock().await.pop_front().ok_or_else(|| {
            BriefAiError::InvalidResponse("scripted client ran out of replies".to_string())
        })?;
        Ok(ChatResponse {
            message: Message::assistant_text(reply),
            finish_reason: Some("STOP".to_string()),
            usage: ChatUsage::default(),
        })
    }
}

struct Harness {
    orchestrator: AnalysisOrchestrator,
    client: Arc<ScriptedClient>,
    store: Arc<InMemoryObjectStore>,
    history: Arc<Mutex<AnalysisHistory>>,
    updates: Arc<Mutex<Vec<ProgressUpdate>>>,
}

fn harness(store: InMemoryObjectStore, replies: &[&str], embed_source: EmbedSource) -> Harness {
    let client = Arc::new(ScriptedClient::new(replies));
    let store = Arc::new(store);
    let history = Arc::new(Mutex::new(AnalysisHistory::new()));
    let mut config = OrchestratorConfig::new("gemini-2.0-flash");
    config.embed_source = embed_source;
    let mut orchestrator = AnalysisOrchestrator::new(
        store.clone(),
        client.clone(),
        Arc::new(FixtureRetriever::default()),
        history.clone(),
        config,
    );
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    orchestrator.subscribe(move |update| {
        sink.lock().expect("updates lock").push(update.clone());
    });
    Harness {
        orchestrator,
        client,
        store,
        history,
        updates,
    }
}

fn document() -> IngestedDocument {
    IngestedDocument::new(
        "complaint.txt",
        "text/plain",
        b"Innovate Corp alleges infringement of its data syncing patent.".to_vec(),
    )
}

fn progress_values(updates: &Arc<Mutex<Vec<ProgressUpdate>>>) -> Vec<u8> {
    updates
        .lock()
        .expect("updates lock")
        .iter()
        .map(|update| update.progress)
        .collect()
}

#[tokio::test]
async fn integration_successful_run_completes_with_single_result() {
    let h = harness(
        InMemoryObjectStore::new(),
        &[EMBEDDING_REPLY, MEMO_REPLY],
        EmbedSource::DataUri,
    );

    let outcome = h
        .orchestrator
        .analyze(&document(), Some("Focus on damages".to_string()))
        .await
        .expect("run should not hit an illegal transition");

    let AnalysisOutcome::Completed { analysis, result } = outcome else {
        panic!("expected completed outcome, got {outcome:?}");
    };
    assert_eq!(analysis.id, "case-001");
    assert_eq!(analysis.status, AnalysisStatus::Completed);
    assert_eq!(result.memo.title, "Preliminary Memo for complaint.txt");
    assert_eq!(result.memo.sections[0].content, "M");
    assert_eq!(result.identified_laws.len(), 2);
    assert_eq!(result.summary, "S");
    assert_eq!(result.similar_cases.len(), 3);

    let history = h.history.lock().expect("history lock");
    assert_eq!(history.result_for("case-001").expect("stored result"), &result);
    drop(history);

    assert_eq!(progress_values(&h.updates), vec![0, 20, 40, 60, 80, 100]);
    let labels = h
        .updates
        .lock()
        .expect("updates lock")
        .iter()
        .map(|update| update.label)
        .collect::<Vec<_>>();
    assert_eq!(labels[0], Some("Uploading document securely..."));
    assert_eq!(labels[4], Some("Finalizing analysis..."));
    assert_eq!(labels[5], None);

    let keys = h.store.keys().await;
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("documents/"));
    assert!(keys[0].ends_with("-complaint.txt"));

    let requests = h.client.requests.lock().await;
    assert_eq!(requests.len(), 2);
    let drafting_prompt = requests[1].messages[0].text_content();
    assert!(drafting_prompt.contains("---\nDataFlow Inc. v. Syncer (2019): "));
    assert!(drafting_prompt.contains("User Instructions: Focus on damages"));
}

#[tokio::test]
async fn integration_unauthorized_upload_fails_without_result() {
    let h = harness(
        InMemoryObjectStore::failing_with(ServiceError::from_untagged(
            "Firebase Storage: User does not have permission. (storage/unauthorized)",
        )),
        &[],
        EmbedSource::DataUri,
    );

    let outcome = h
        .orchestrator
        .analyze(&document(), None)
        .await
        .expect("failure is an outcome, not an error");

    let AnalysisOutcome::Failed { analysis, notice } = outcome else {
        panic!("expected failed outcome, got {outcome:?}");
    };
    assert_eq!(analysis.status, AnalysisStatus::Failed);
    assert_eq!(notice.title, "Analysis Failed");
    assert_eq!(notice.description, UPLOAD_PERMISSION_MESSAGE);
    assert_eq!(notice.kind, ErrorKind::Permission);

    assert!(matches!(
        h.history.lock().expect("history lock").result_for(&analysis.id),
        Err(HistoryError::NotReady {
            status: AnalysisStatus::Failed,
            ..
        })
    ));
    assert!(h.client.requests.lock().await.is_empty());

    let updates = h.updates.lock().expect("updates lock");
    assert!(updates.iter().all(|update| update.progress < 100));
    assert_eq!(
        updates.last().map(|update| update.state),
        Some(PipelineState::Failed {
            kind: ErrorKind::Permission
        })
    );
}

#[tokio::test]
async fn regression_malformed_draft_fails_run_as_validation() {
    let h = harness(
        InMemoryObjectStore::new(),
        &[EMBEDDING_REPLY, r#"{"preliminaryMemo":"M"}"#],
        EmbedSource::DataUri,
    );

    let outcome = h
        .orchestrator
        .analyze(&document(), None)
        .await
        .expect("outcome");
    let AnalysisOutcome::Failed { notice, .. } = outcome else {
        panic!("expected failed outcome, got {outcome:?}");
    };
    assert_eq!(notice.kind, ErrorKind::Validation);
    assert_eq!(notice.stage, "drafting");
    assert_eq!(notice.description, DEFAULT_FAILURE_MESSAGE);

    let progress = progress_values(&h.updates);
    assert_eq!(progress, vec![0, 20, 40, 60, 60]);
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn regression_rerun_does_not_alter_completed_analysis() {
    let h = harness(
        InMemoryObjectStore::new(),
        &[EMBEDDING_REPLY, MEMO_REPLY, r#"{"embedding":[]}"#],
        EmbedSource::DataUri,
    );

    let first = h
        .orchestrator
        .analyze(&document(), None)
        .await
        .expect("first run");
    assert_eq!(first.analysis().status, AnalysisStatus::Completed);

    let second = h
        .orchestrator
        .analyze(&document(), None)
        .await
        .expect("second run");
    assert_eq!(second.analysis().id, "case-002");
    assert_eq!(second.analysis().status, AnalysisStatus::Failed);

    let history = h.history.lock().expect("history lock");
    assert_eq!(
        history.get("case-001").map(|analysis| analysis.status),
        Some(AnalysisStatus::Completed)
    );
    assert!(history.result_for("case-001").is_ok());
    assert_eq!(history.analyses()[0].id, "case-002");

    let progress = progress_values(&h.updates);
    assert_eq!(&progress[6..], &[0, 20, 20]);
}

#[tokio::test]
async fn integration_oversized_document_never_starts_a_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("huge.pdf");
    std::fs::File::create(&path)
        .expect("create")
        .set_len(MAX_DOCUMENT_BYTES + 1)
        .expect("set len");
    let h = harness(InMemoryObjectStore::new(), &[], EmbedSource::DataUri);

    let error = h
        .orchestrator
        .analyze_path(&DocumentIngestor::default(), &path, None)
        .await
        .expect_err("oversized document must be rejected");

    assert!(matches!(
        error,
        AnalyzeError::Ingest(IngestError::TooLarge { .. })
    ));
    assert!(h.history.lock().expect("history lock").analyses().is_empty());
    assert!(h.updates.lock().expect("updates lock").is_empty());
    assert!(h.store.keys().await.is_empty());
}

#[tokio::test]
async fn functional_storage_url_embedding_references_uploaded_object() {
    let h = harness(
        InMemoryObjectStore::new(),
        &[EMBEDDING_REPLY, MEMO_REPLY],
        EmbedSource::StorageUrl,
    );

    h.orchestrator
        .analyze(&document(), None)
        .await
        .expect("outcome");

    let requests = h.client.requests.lock().await;
    let media = requests[0].messages[0]
        .content
        .iter()
        .find_map(|block| match block {
            ContentBlock::Media { source } => Some(source.clone()),
            ContentBlock::Text { .. } => None,
        })
        .expect("embedding request carries media");
    let MediaSource::Url { url, mime_type } = media else {
        panic!("expected url media, got {media:?}");
    };
    assert!(url.starts_with("memory://documents/"));
    assert_eq!(mime_type, "text/plain");
}

#[tokio::test]
async fn regression_panicking_subscriber_does_not_abort_run() {
    let mut h = harness(
        InMemoryObjectStore::new(),
        &[EMBEDDING_REPLY, MEMO_REPLY],
        EmbedSource::DataUri,
    );
    h.orchestrator.subscribe(|_| panic!("subscriber failure"));

    let outcome = h
        .orchestrator
        .analyze(&document(), None)
        .await
        .expect("outcome");
    assert_eq!(outcome.analysis().status, AnalysisStatus::Completed);
    assert_eq!(progress_values(&h.updates).last(), Some(&100));
}
