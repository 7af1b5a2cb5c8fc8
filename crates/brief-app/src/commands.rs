use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use brief_cli::{Cli, CliOutputFormat};
use brief_core::write_text_atomic;
use brief_dashboard::{
    export_markdown, recent_analyses, render_config_banner, render_failure,
    render_ingest_rejection, render_progress, render_recent_analyses, render_result, view,
    ResultView,
};
use brief_flows::{
    generate_memo_from_documents, refine_memo, MultiDocumentMemoInput, RefineMemoInput,
};
use brief_orchestrator::{AnalysisHistory, AnalysisOrchestrator, AnalysisOutcome, DocumentIngestor};

use crate::startup_wiring::{
    build_llm_client, build_object_store, build_retriever, load_shared_history,
    orchestrator_config, save_shared_history, storage_config,
};

pub(crate) async fn execute_analyze_command(
    cli: &Cli,
    file: &Path,
    instructions: Option<String>,
    export: Option<&Path>,
    format: CliOutputFormat,
) -> Result<()> {
    let document = match DocumentIngestor::default().ingest(file).await {
        Ok(document) => document,
        Err(error) => {
            eprintln!("{}", render_ingest_rejection(&error));
            return Err(error).context("document was not analyzed");
        }
    };
    let storage = match storage_config(cli) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{}", render_config_banner(&error));
            bail!("analyze is disabled: {error}");
        }
    };
    let store = build_object_store(storage, cli.request_timeout_ms)?;
    let llm = build_llm_client(cli)?;
    let retriever = build_retriever(cli)?;
    let history = load_shared_history(&cli.history_path)?;

    let mut orchestrator = AnalysisOrchestrator::new(
        store,
        llm,
        retriever,
        history.clone(),
        orchestrator_config(cli),
    );
    orchestrator.subscribe(|update| eprintln!("{}", render_progress(update)));

    let outcome = orchestrator.analyze(&document, instructions).await?;
    save_shared_history(&history, &cli.history_path)?;

    match outcome {
        AnalysisOutcome::Completed { analysis, .. } => {
            tracing::info!(analysis = analysis.id.as_str(), "analysis saved");
            with_result_view(&history, &analysis.id, None, |opened| {
                print_result(opened, format)?;
                if let Some(path) = export {
                    export_markdown(opened, path)?;
                    eprintln!("exported {} to {}", analysis.id, path.display());
                }
                Ok(())
            })
        }
        AnalysisOutcome::Failed { analysis, notice } => {
            eprintln!("{}", render_failure(&notice));
            Err(anyhow!("analysis {} failed ({})", analysis.id, notice.kind))
        }
    }
}

pub(crate) fn execute_history_command(cli: &Cli, format: CliOutputFormat) -> Result<()> {
    let history = AnalysisHistory::load(&cli.history_path)?;
    let rows = recent_analyses(&history);
    match format {
        CliOutputFormat::Text => println!("{}", render_recent_analyses(&rows)),
        CliOutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&rows).context("failed to render history json")?
        ),
    }
    Ok(())
}

pub(crate) fn execute_view_command(
    cli: &Cli,
    id: &str,
    search: Option<&str>,
    export: Option<&Path>,
    format: CliOutputFormat,
) -> Result<()> {
    let history = Mutex::new(AnalysisHistory::load(&cli.history_path)?);
    with_result_view(&history, id, search, |opened| {
        print_result(opened, format)?;
        if let Some(path) = export {
            export_markdown(opened, path)?;
            eprintln!("exported {id} to {}", path.display());
        }
        Ok(())
    })
}

pub(crate) async fn execute_refine_command(
    cli: &Cli,
    id: &str,
    feedback: &str,
    original_input: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let original_memo = {
        let history = AnalysisHistory::load(&cli.history_path)?;
        let opened = view(&history, id)?;
        opened
            .result
            .memo
            .sections
            .iter()
            .map(|section| section.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    let document = DocumentIngestor::default()
        .ingest(original_input)
        .await
        .context("failed to read original input")?;
    let llm = build_llm_client(cli)?;
    let input = RefineMemoInput {
        original_memo,
        user_feedback: feedback.to_string(),
        original_input: document.text(),
    };
    let refined = refine_memo(llm.as_ref(), &cli.model, &input).await?;
    write_or_print(output, &refined.refined_memo)
}

pub(crate) async fn execute_compose_command(
    cli: &Cli,
    files: &[PathBuf],
    instructions: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let ingestor = DocumentIngestor::default();
    let mut document_texts = Vec::with_capacity(files.len());
    for file in files {
        let document = ingestor
            .ingest(file)
            .await
            .with_context(|| format!("failed to ingest {}", file.display()))?;
        document_texts.push(document.text());
    }
    let llm = build_llm_client(cli)?;
    let input = MultiDocumentMemoInput::new(document_texts, instructions);
    let composed = generate_memo_from_documents(llm.as_ref(), &cli.model, &input).await?;
    write_or_print(output, &composed.memo)
}

fn with_result_view<F>(
    history: &Mutex<AnalysisHistory>,
    id: &str,
    search: Option<&str>,
    action: F,
) -> Result<()>
where
    F: FnOnce(&ResultView<'_>) -> Result<()>,
{
    let guard = match history.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let mut opened = view(&guard, id)?;
    if let Some(term) = search {
        opened = opened.search(term);
    }
    action(&opened)
}

fn print_result(opened: &ResultView<'_>, format: CliOutputFormat) -> Result<()> {
    match format {
        CliOutputFormat::Text => println!("{}", render_result(opened)),
        CliOutputFormat::Json => {
            let mut payload =
                serde_json::to_value(opened.result).context("failed to render result json")?;
            payload["similarCases"] = serde_json::to_value(&opened.similar_cases)
                .context("failed to render similar cases json")?;
            payload["analysis"] =
                serde_json::to_value(opened.analysis).context("failed to render analysis json")?;
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to render result json")?
            );
        }
    }
    Ok(())
}

fn write_or_print(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            write_text_atomic(path, text)?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
