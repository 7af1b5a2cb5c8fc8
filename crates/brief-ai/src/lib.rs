//! Generative-model client surface for Brief.
//!
//! Exposes the provider-neutral [`LlmClient`] contract and the Google Gemini
//! REST implementation used by the analysis flows.
mod google;
mod retry;
mod types;

pub use google::{GoogleClient, GoogleConfig, DEFAULT_GOOGLE_API_BASE, DEFAULT_GOOGLE_MODEL};
pub use types::{
    BriefAiError, ChatRequest, ChatResponse, ChatUsage, ContentBlock, LlmClient, MediaSource,
    Message, MessageRole,
};
