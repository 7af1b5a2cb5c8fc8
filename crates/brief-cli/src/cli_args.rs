use std::path::PathBuf;

use brief_ai::{DEFAULT_GOOGLE_API_BASE, DEFAULT_GOOGLE_MODEL};
use brief_flows::DEFAULT_TOP_K;
use clap::{Parser, Subcommand};

use crate::{
    parse_http_url, parse_positive_u64, parse_positive_usize, CliEmbedSource, CliOutputFormat,
};

pub const DEFAULT_HISTORY_PATH: &str = ".brief/analyses.json";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Parser)]
#[command(
    name = "brief",
    about = "Analyze legal documents: upload, embed, retrieve similar cases, and draft a preliminary memo",
    version
)]
/// Public struct `Cli` parsed by the `brief` binary.
pub struct Cli {
    #[arg(
        long = "google-api-key",
        env = "GOOGLE_API_KEY",
        hide_env_values = true,
        global = true,
        help = "API key for the Gemini generateContent endpoint"
    )]
    pub google_api_key: Option<String>,

    #[arg(
        long,
        env = "BRIEF_MODEL",
        default_value = DEFAULT_GOOGLE_MODEL,
        global = true,
        help = "Gemini model used by every flow"
    )]
    pub model: String,

    #[arg(
        long = "google-api-base",
        env = "BRIEF_GOOGLE_API_BASE",
        default_value = DEFAULT_GOOGLE_API_BASE,
        value_parser = parse_http_url,
        global = true,
        help = "Base URL for the Gemini REST API"
    )]
    pub google_api_base: String,

    #[arg(
        long = "request-timeout-ms",
        env = "BRIEF_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        global = true,
        help = "HTTP request timeout for provider, storage, and index calls"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "provider-max-retries",
        env = "BRIEF_PROVIDER_MAX_RETRIES",
        default_value_t = 0,
        global = true,
        help = "Retries for retryable provider statuses within one flow call; runs themselves are never retried"
    )]
    pub provider_max_retries: usize,

    #[arg(
        long = "firebase-api-key",
        env = "FIREBASE_API_KEY",
        hide_env_values = true,
        global = true,
        help = "Firebase web API key used for Storage uploads"
    )]
    pub firebase_api_key: Option<String>,

    #[arg(
        long = "firebase-project-id",
        env = "FIREBASE_PROJECT_ID",
        global = true,
        help = "Firebase project id"
    )]
    pub firebase_project_id: Option<String>,

    #[arg(
        long = "firebase-storage-bucket",
        env = "FIREBASE_STORAGE_BUCKET",
        global = true,
        help = "Firebase Storage bucket that receives uploaded documents"
    )]
    pub firebase_storage_bucket: Option<String>,

    #[arg(
        long = "firebase-storage-api-base",
        env = "FIREBASE_STORAGE_API_BASE",
        global = true,
        help = "Override for the Firebase Storage REST base URL"
    )]
    pub firebase_storage_api_base: Option<String>,

    #[arg(
        long = "vector-index-url",
        env = "BRIEF_VECTOR_INDEX_URL",
        value_parser = parse_http_url,
        global = true,
        help = "Similar-case vector index endpoint; the built-in fixture cases are used when unset"
    )]
    pub vector_index_url: Option<String>,

    #[arg(
        long = "top-k",
        env = "BRIEF_TOP_K",
        default_value_t = DEFAULT_TOP_K,
        value_parser = parse_positive_usize,
        global = true,
        help = "Number of similar cases retrieved per analysis"
    )]
    pub top_k: usize,

    #[arg(
        long = "history-path",
        env = "BRIEF_HISTORY_PATH",
        default_value = DEFAULT_HISTORY_PATH,
        global = true,
        help = "JSON file holding recent analyses and their results"
    )]
    pub history_path: PathBuf,

    #[arg(
        long = "embed-from",
        env = "BRIEF_EMBED_FROM",
        value_enum,
        default_value = "data-uri",
        global = true,
        help = "Document reference handed to the embedding flow"
    )]
    pub embed_from: CliEmbedSource,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Upload a document and run the full analysis pipeline.
    Analyze {
        file: PathBuf,
        #[arg(long, help = "Extra guidance for the memo, e.g. \"Focus on contract law aspects\"")]
        instructions: Option<String>,
        #[arg(long, help = "Write the finished memo as Markdown to this path")]
        export: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "text")]
        format: CliOutputFormat,
    },
    /// List recent analyses, newest first.
    History {
        #[arg(long, value_enum, default_value = "text")]
        format: CliOutputFormat,
    },
    /// Show the result of a completed analysis.
    View {
        id: String,
        #[arg(long, help = "Only show similar cases whose name or summary contains this text")]
        search: Option<String>,
        #[arg(long, help = "Write the memo as Markdown to this path")]
        export: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "text")]
        format: CliOutputFormat,
    },
    /// Rewrite a completed analysis' memo from feedback.
    Refine {
        id: String,
        #[arg(long)]
        feedback: String,
        #[arg(long = "original-input", help = "Document the memo was drafted from")]
        original_input: PathBuf,
        #[arg(long, help = "Write the refined memo to this path instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Draft one memo from several documents.
    Compose {
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
        #[arg(long)]
        instructions: Option<String>,
        #[arg(long, help = "Write the memo to this path instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Report which integrations are configured.
    Doctor,
}
