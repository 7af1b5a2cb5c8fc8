use brief_ai::LlmClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{prompt::PromptFlow, FlowError};

const MULTI_DOCUMENT_MEMO_FLOW: PromptFlow = PromptFlow {
    name: "multi-document memo",
    template: r#"You are an expert legal assistant tasked with generating a preliminary case memorandum based on the provided documents.

Analyze the following documents and synthesize the key facts, legal concepts, and relevant precedents to generate a well-structured legal memorandum.

Documents:
{% for text in documentTexts %}
--Document {{ loop.index0 }}--:
{{ text }}
{% endfor %}

{% if userInstructions %}
User Instructions: {{ userInstructions }}

{% endif %}
Return the memorandum in the "memo" field."#,
    output_schema: multi_document_memo_schema,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiDocumentMemoInput {
    pub document_texts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_instructions: Option<String>,
}

impl MultiDocumentMemoInput {
    pub fn new(document_texts: Vec<String>, user_instructions: Option<String>) -> Self {
        Self {
            document_texts,
            user_instructions: user_instructions.filter(|text| !text.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiDocumentMemoOutput {
    pub memo: String,
}

fn multi_document_memo_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "memo": {"type": "string", "description": "The generated legal memorandum."}
        },
        "required": ["memo"]
    })
}

pub async fn generate_memo_from_documents(
    client: &dyn LlmClient,
    model: &str,
    input: &MultiDocumentMemoInput,
) -> Result<MultiDocumentMemoOutput, FlowError> {
    if input.document_texts.is_empty() {
        return Err(FlowError::InvalidInput(
            "at least one document is required".to_string(),
        ));
    }
    tracing::debug!(
        documents = input.document_texts.len(),
        "composing memo from documents"
    );
    MULTI_DOCUMENT_MEMO_FLOW
        .run(client, model, input, Vec::new())
        .await
}
