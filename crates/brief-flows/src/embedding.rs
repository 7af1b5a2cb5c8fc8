use brief_ai::{LlmClient, MediaSource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{prompt::PromptFlow, FlowError};

const EMBEDDING_FLOW: PromptFlow = PromptFlow {
    name: "document embedding",
    template: "Generate a vector embedding for the following legal document. \
Return the embedding as a JSON object whose \"embedding\" field is an array of numbers.\n\n\
Document: attached as {{ mime_type }}.",
    output_schema: embedding_schema,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// How the document reaches the provider: inline or by durable URL.
pub enum DocumentReference {
    DocumentDataUri(String),
    DocumentUrl { url: String, mime_type: String },
}

impl DocumentReference {
    fn to_media(&self) -> Result<MediaSource, FlowError> {
        match self {
            Self::DocumentDataUri(uri) => {
                let (mime_type, data) = parse_data_uri(uri)?;
                Ok(MediaSource::Base64 {
                    mime_type: mime_type.to_string(),
                    data: data.to_string(),
                })
            }
            Self::DocumentUrl { url, mime_type } => Ok(MediaSource::Url {
                url: url.clone(),
                mime_type: mime_type.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Public struct `DocumentEmbeddingOutput` returned by the embedding flow.
pub struct DocumentEmbeddingOutput {
    pub embedding: Vec<f64>,
}

fn embedding_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "embedding": {
                "type": "array",
                "items": {"type": "number"},
                "description": "The embedding of the document."
            }
        },
        "required": ["embedding"]
    })
}

/// Splits `data:<mime>;base64,<payload>` into its MIME type and payload.
pub fn parse_data_uri(uri: &str) -> Result<(&str, &str), FlowError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| FlowError::InvalidInput("document data URI must start with `data:`".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| FlowError::InvalidInput("document data URI has no payload".into()))?;
    let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
        FlowError::InvalidInput("document data URI must use base64 encoding".into())
    })?;
    if mime_type.trim().is_empty() {
        return Err(FlowError::InvalidInput(
            "document data URI must include a MIME type".into(),
        ));
    }
    Ok((mime_type, payload))
}

pub async fn generate_document_embedding(
    client: &dyn LlmClient,
    model: &str,
    document: &DocumentReference,
) -> Result<DocumentEmbeddingOutput, FlowError> {
    let media = document.to_media()?;
    let context = json!({ "mime_type": media.mime_type() });
    let output: DocumentEmbeddingOutput = EMBEDDING_FLOW
        .run(client, model, &context, vec![media])
        .await?;
    if output.embedding.is_empty() {
        return Err(EMBEDDING_FLOW.invalid_output("embedding was empty"));
    }
    if output.embedding.iter().any(|value| !value.is_finite()) {
        return Err(EMBEDDING_FLOW.invalid_output("embedding contains a non-finite value"));
    }
    tracing::debug!(dimensions = output.embedding.len(), "document embedded");
    Ok(output)
}
