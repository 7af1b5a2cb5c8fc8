use brief_ai::LlmClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{prompt::PromptFlow, FlowError};

const PRELIMINARY_MEMO_FLOW: PromptFlow = PromptFlow {
    name: "preliminary memo",
    template: r#"You are an expert legal assistant tasked with generating a preliminary case memorandum.

Synthesize the key facts, legal concepts, and relevant precedents from the provided document and similar cases to generate a well-structured memorandum.

Primary Document Text: {{ documentText }}

Similar Cases:
{% for case in similarCases %}
---
{{ case }}
{% endfor %}

User Instructions: {% if userInstructions %}{{ userInstructions }}{% else %}None{% endif %}


Output the preliminary memo, a list of identified laws, and a summary of the document.

Preliminary Case Memorandum:
{
  "preliminaryMemo": "...",
  "identifiedLaws": ["Law1", "Law2", ...],
  "summary": "..."
}"#,
    output_schema: preliminary_memo_schema,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Public struct `PreliminaryMemoInput` consumed by the drafting flow.
pub struct PreliminaryMemoInput {
    pub document_text: String,
    pub similar_cases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_instructions: Option<String>,
}

impl PreliminaryMemoInput {
    pub fn new(
        document_text: impl Into<String>,
        similar_cases: Vec<String>,
        user_instructions: Option<String>,
    ) -> Self {
        Self {
            document_text: document_text.into(),
            similar_cases,
            user_instructions: user_instructions.filter(|text| !text.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Public struct `PreliminaryMemoOutput` returned by the drafting flow.
pub struct PreliminaryMemoOutput {
    pub preliminary_memo: String,
    pub identified_laws: Vec<String>,
    pub summary: String,
}

fn preliminary_memo_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "preliminaryMemo": {
                "type": "string",
                "description": "The generated preliminary case memorandum."
            },
            "identifiedLaws": {
                "type": "array",
                "items": {"type": "string"},
                "description": "List of identified laws."
            },
            "summary": {"type": "string", "description": "Summary of document."}
        },
        "required": ["preliminaryMemo", "identifiedLaws", "summary"]
    })
}

pub async fn generate_preliminary_memo(
    client: &dyn LlmClient,
    model: &str,
    input: &PreliminaryMemoInput,
) -> Result<PreliminaryMemoOutput, FlowError> {
    tracing::debug!(
        similar_cases = input.similar_cases.len(),
        has_instructions = input.user_instructions.is_some(),
        "drafting preliminary memo"
    );
    PRELIMINARY_MEMO_FLOW
        .run(client, model, input, Vec::new())
        .await
}
