use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use brief_ai::{GoogleClient, GoogleConfig};
use brief_core::ErrorKind;
use brief_dashboard::{filter_similar_cases, render_markdown, render_result, view};
use brief_flows::VectorIndexRetriever;
use brief_orchestrator::{
    AnalysisHistory, AnalysisOrchestrator, AnalysisOutcome, AnalysisStatus, DocumentIngestor,
    OrchestratorConfig, DEFAULT_FAILURE_MESSAGE, UPLOAD_PERMISSION_MESSAGE,
};
use brief_storage::{FirebaseStorageClient, StorageConfig};
use httpmock::prelude::*;
use serde_json::{json, Value};

const BUCKET: &str = "brief-e2e.appspot.com";
const MODEL_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn gemini_reply(payload: Value) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": payload.to_string()}]},
            "finishReason": "STOP"
        }]
    })
}

struct Services {
    server: MockServer,
    workspace: tempfile::TempDir,
}

impl Services {
    fn start() -> Self {
        Self {
            server: MockServer::start(),
            workspace: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn document(&self, name: &str, text: &str) -> PathBuf {
        let path = self.workspace.path().join(name);
        std::fs::write(&path, text).expect("write document");
        path
    }

    fn history_path(&self) -> PathBuf {
        self.workspace.path().join(".brief").join("analyses.json")
    }

    fn orchestrator(&self, history: Arc<Mutex<AnalysisHistory>>) -> AnalysisOrchestrator {
        let storage = StorageConfig::from_values(
            Some("firebase-key"),
            Some("brief-e2e"),
            Some(BUCKET),
            Some(&self.server.url("/v0")),
        )
        .expect("storage config");
        let store = FirebaseStorageClient::new(storage, 5_000).expect("storage client");
        let llm = GoogleClient::new(GoogleConfig {
            api_base: self.server.url("/v1beta"),
            api_key: "google-key".to_string(),
            request_timeout_ms: 5_000,
            max_retries: 0,
            retry_budget_ms: 0,
        })
        .expect("google client");
        let retriever =
            VectorIndexRetriever::new(self.server.url("/index/neighbors"), 5_000).expect("index");
        AnalysisOrchestrator::new(
            Arc::new(store),
            Arc::new(llm),
            Arc::new(retriever),
            history,
            OrchestratorConfig::new("gemini-2.0-flash"),
        )
    }
}

fn mock_firebase_success(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST)
            .path(format!("/v0/b/{BUCKET}/o"))
            .query_param("uploadType", "media")
            .query_param("key", "firebase-key")
            .header("content-type", "text/plain");
        then.status(200)
            .json_body(json!({"bucket": BUCKET}));
    });
}

fn load(path: &Path) -> AnalysisHistory {
    AnalysisHistory::load(path).expect("history should load")
}

#[tokio::test]
async fn integration_document_flows_from_upload_to_rendered_memo() {
    let services = Services::start();
    let server = &services.server;
    let document = services.document("complaint.txt", "Innovate Corp alleges patent infringement.");

    let upload = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/v0/b/{BUCKET}/o"))
            .query_param("uploadType", "media")
            .query_param("key", "firebase-key")
            .header("content-type", "text/plain")
            .body("Innovate Corp alleges patent infringement.");
        then.status(200).json_body(json!({"bucket": BUCKET}));
    });
    let metadata = server.mock(|when, then| {
        when.method(GET).path_includes("/o/documents");
        then.status(200)
            .json_body(json!({"bucket": BUCKET, "downloadTokens": "tok-e2e"}));
    });
    let embed = server.mock(|when, then| {
        when.method(POST)
            .path(MODEL_PATH)
            .body_includes("Generate a vector embedding")
            .body_includes("\"inlineData\"");
        then.status(200)
            .json_body(gemini_reply(json!({"embedding": [0.5, 0.25, 0.125]})));
    });
    let index = server.mock(|when, then| {
        when.method(POST)
            .path("/index/neighbors")
            .body_includes("\"topK\":3");
        then.status(200).json_body(json!({
            "neighbors": [
                {"id": "sc-02", "name": "Tectron Corp. v. InfoSys (2021)", "summary": "Trade secret misappropriation in software.", "score": 0.71},
                {"id": "sc-01", "name": "DataFlow Inc. v. Syncer (2019)", "summary": "Broad reading of data synchronization claims.", "score": 0.92}
            ]
        }));
    });
    let draft = server.mock(|when, then| {
        when.method(POST)
            .path(MODEL_PATH)
            .body_includes("Primary Document Text: Innovate Corp alleges patent infringement.")
            .body_includes("DataFlow Inc. v. Syncer (2019): Broad reading");
        then.status(200).json_body(gemini_reply(json!({
            "preliminaryMemo": "M",
            "identifiedLaws": ["L1", "L2"],
            "summary": "S"
        })));
    });

    let history_path = services.history_path();
    let history = Arc::new(Mutex::new(load(&history_path)));
    let mut orchestrator = services.orchestrator(history.clone());
    let progress = Arc::new(Mutex::new(Vec::new()));
    let sink = progress.clone();
    orchestrator.subscribe(move |update| {
        sink.lock().expect("progress lock").push(update.progress);
    });

    let outcome = orchestrator
        .analyze_path(&DocumentIngestor::default(), &document, None)
        .await
        .expect("pipeline should run");

    upload.assert();
    metadata.assert();
    embed.assert();
    index.assert();
    draft.assert();

    let AnalysisOutcome::Completed { analysis, result } = outcome else {
        panic!("expected a completed analysis, got {outcome:?}");
    };
    assert_eq!(analysis.status, AnalysisStatus::Completed);
    assert_eq!(result.memo.sections[0].content, "M");
    assert_eq!(result.identified_laws.len(), 2);
    assert_eq!(result.summary, "S");
    assert_eq!(result.similar_cases[0].id, "sc-01");
    assert_eq!(
        *progress.lock().expect("progress lock"),
        vec![0, 20, 40, 60, 80, 100]
    );

    history
        .lock()
        .expect("history lock")
        .save(&history_path)
        .expect("save history");
    let reloaded = load(&history_path);
    let opened = view(&reloaded, &analysis.id).expect("completed analysis is viewable");
    let rendered = render_result(&opened);
    assert!(rendered.starts_with("Preliminary Memo for complaint.txt"));
    assert!(render_markdown(&opened.search("tectron")).contains("**Tectron Corp. v. InfoSys (2021)**"));
    assert_eq!(filter_similar_cases(&result.similar_cases, "DATAFLOW").len(), 1);
}

#[tokio::test]
async fn integration_unauthorized_upload_fails_before_any_model_call() {
    let services = Services::start();
    let server = &services.server;
    let document = services.document("complaint.txt", "text");

    server.mock(|when, then| {
        when.method(POST).path(format!("/v0/b/{BUCKET}/o"));
        then.status(403).json_body(json!({
            "error": {"code": 403, "message": "Permission denied. (storage/unauthorized)"}
        }));
    });
    let gemini = server.mock(|when, then| {
        when.method(POST).path(MODEL_PATH);
        then.status(200)
            .json_body(gemini_reply(json!({"embedding": [1.0]})));
    });

    let history = Arc::new(Mutex::new(AnalysisHistory::new()));
    let orchestrator = services.orchestrator(history.clone());
    let outcome = orchestrator
        .analyze_path(&DocumentIngestor::default(), &document, None)
        .await
        .expect("failure is reported as an outcome");

    gemini.assert_calls(0);
    let AnalysisOutcome::Failed { analysis, notice } = outcome else {
        panic!("expected a failed analysis, got {outcome:?}");
    };
    assert_eq!(notice.kind, ErrorKind::Permission);
    assert_eq!(notice.description, UPLOAD_PERMISSION_MESSAGE);
    let history = history.lock().expect("history lock");
    assert_eq!(
        history.get(&analysis.id).map(|entry| entry.status),
        Some(AnalysisStatus::Failed)
    );
    assert!(history.result_for(&analysis.id).is_err());
}

#[tokio::test]
async fn regression_rejected_provider_key_does_not_blame_storage_rules() {
    let services = Services::start();
    let server = &services.server;
    let document = services.document("complaint.txt", "text");

    mock_firebase_success(server);
    server.mock(|when, then| {
        when.method(GET).path_includes("/o/documents");
        then.status(200)
            .json_body(json!({"bucket": BUCKET, "downloadTokens": "tok"}));
    });
    server.mock(|when, then| {
        when.method(POST).path(MODEL_PATH);
        then.status(403)
            .json_body(json!({"error": {"code": 403, "message": "API key not valid"}}));
    });

    let history = Arc::new(Mutex::new(AnalysisHistory::new()));
    let outcome = services
        .orchestrator(history)
        .analyze_path(&DocumentIngestor::default(), &document, None)
        .await
        .expect("outcome");

    let AnalysisOutcome::Failed { notice, .. } = outcome else {
        panic!("expected a failed analysis, got {outcome:?}");
    };
    assert_eq!(notice.kind, ErrorKind::Permission);
    assert_eq!(notice.stage, "embedding");
    assert_eq!(notice.description, DEFAULT_FAILURE_MESSAGE);
}

#[tokio::test]
async fn regression_missing_uploaded_object_is_not_found_failure() {
    let services = Services::start();
    let server = &services.server;
    let document = services.document("complaint.txt", "text");

    mock_firebase_success(server);
    server.mock(|when, then| {
        when.method(GET).path_includes("/o/documents");
        then.status(404)
            .json_body(json!({"error": {"code": 404, "message": "storage/object-not-found"}}));
    });

    let history = Arc::new(Mutex::new(AnalysisHistory::new()));
    let outcome = services
        .orchestrator(history)
        .analyze_path(&DocumentIngestor::default(), &document, None)
        .await
        .expect("outcome");

    let AnalysisOutcome::Failed { notice, .. } = outcome else {
        panic!("expected a failed analysis, got {outcome:?}");
    };
    assert_eq!(notice.kind, ErrorKind::NotFound);
    assert_eq!(
        notice.description,
        "Upload failed: The file could not be found after upload."
    );
}
