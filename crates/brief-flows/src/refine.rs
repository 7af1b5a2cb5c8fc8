use brief_ai::LlmClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{prompt::PromptFlow, FlowError};

const REFINE_MEMO_FLOW: PromptFlow = PromptFlow {
    name: "memo refinement",
    template: r#"You are an expert legal assistant. You will improve an existing legal memorandum based on user feedback.

Original Memorandum:
{{ originalMemo }}

User Feedback:
{{ userFeedback }}

Original input documents:
{{ originalInput }}

Based on the user feedback and the original documents, rewrite the memorandum to address the user's concerns and improve its quality and relevance. Return only the rewritten memorandum in the "refinedMemo" field."#,
    output_schema: refine_memo_schema,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineMemoInput {
    pub original_memo: String,
    pub user_feedback: String,
    pub original_input: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineMemoOutput {
    pub refined_memo: String,
}

fn refine_memo_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "refinedMemo": {
                "type": "string",
                "description": "The refined memorandum based on user feedback."
            }
        },
        "required": ["refinedMemo"]
    })
}

/// Rewrites a memo against user feedback. Single shot; callers decide whether
/// to keep the result.
pub async fn refine_memo(
    client: &dyn LlmClient,
    model: &str,
    input: &RefineMemoInput,
) -> Result<RefineMemoOutput, FlowError> {
    if input.user_feedback.trim().is_empty() {
        return Err(FlowError::InvalidInput(
            "refinement needs non-empty user feedback".to_string(),
        ));
    }
    REFINE_MEMO_FLOW.run(client, model, input, Vec::new()).await
}
