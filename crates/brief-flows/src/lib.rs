//! Structured prompt flows and similar-case retrieval for Brief.
//!
//! Each flow renders a prompt template, asks the model for JSON shaped by a
//! response schema, validates the reply against that schema, and decodes it
//! into a typed output. Retrieval is a capability trait with a fixture
//! implementation and an HTTP vector-index adapter.
mod compose;
mod embedding;
mod error;
mod memo;
mod prompt;
mod refine;
mod retrieval;

#[cfg(test)]
mod test_support;

pub use compose::{generate_memo_from_documents, MultiDocumentMemoInput, MultiDocumentMemoOutput};
pub use embedding::{
    generate_document_embedding, parse_data_uri, DocumentEmbeddingOutput, DocumentReference,
};
pub use error::FlowError;
pub use memo::{generate_preliminary_memo, PreliminaryMemoInput, PreliminaryMemoOutput};
pub use refine::{refine_memo, RefineMemoInput, RefineMemoOutput};
pub use retrieval::{
    default_fixture_cases, summarize_for_prompt, FixtureRetriever, SimilarCase,
    SimilarCaseRetriever, VectorIndexRetriever, DEFAULT_TOP_K,
};
