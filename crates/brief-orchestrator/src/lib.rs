//! Analysis pipeline orchestration for Brief.
//!
//! Provides document ingestion, the explicit pipeline state machine, failure
//! classification, the persisted analysis history, and the orchestrator that
//! drives upload, embedding, retrieval, and drafting for one document.

pub mod failure;
pub mod history;
pub mod ingest;
pub mod model;
pub mod orchestrator;
pub mod state_machine;

pub use failure::*;
pub use history::*;
pub use ingest::*;
pub use model::*;
pub use orchestrator::*;
pub use state_machine::*;
