use brief_ai::{ChatRequest, ContentBlock, LlmClient, MediaSource, Message};
use jsonschema::validator_for;
use minijinja::Environment;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::FlowError;

/// A named prompt template paired with the JSON schema its reply must satisfy.
pub(crate) struct PromptFlow {
    pub(crate) name: &'static str,
    pub(crate) template: &'static str,
    pub(crate) output_schema: fn() -> Value,
}

impl PromptFlow {
    pub(crate) fn render(&self, context: &impl Serialize) -> Result<String, FlowError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.add_template(self.name, self.template)
            .map_err(|source| self.template_error(source))?;
        env.get_template(self.name)
            .and_then(|template| template.render(context))
            .map_err(|source| self.template_error(source))
    }

    pub(crate) async fn run<T: DeserializeOwned>(
        &self,
        client: &dyn LlmClient,
        model: &str,
        context: &impl Serialize,
        media: Vec<MediaSource>,
    ) -> Result<T, FlowError> {
        let prompt = self.render(context)?;
        let schema = (self.output_schema)();

        let mut content = vec![ContentBlock::text(prompt)];
        content.extend(media.into_iter().map(ContentBlock::media));
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![Message::user_blocks(content)],
            json_mode: true,
            response_schema: Some(schema.clone()),
            max_tokens: None,
            temperature: None,
        };

        tracing::debug!(flow = self.name, model, "running prompt flow");
        let response = client
            .complete(request)
            .await
            .map_err(|source| FlowError::Provider {
                flow: self.name,
                source,
            })?;

        let value = extract_json_payload(&response.message.text_content())
            .map_err(|detail| self.invalid_output(detail))?;
        validate_json_against_schema(&schema, &value)
            .map_err(|detail| self.invalid_output(detail))?;
        serde_json::from_value(value).map_err(|error| self.invalid_output(error.to_string()))
    }

    pub(crate) fn invalid_output(&self, detail: impl Into<String>) -> FlowError {
        FlowError::InvalidOutput {
            flow: self.name,
            detail: detail.into(),
        }
    }

    fn template_error(&self, source: minijinja::Error) -> FlowError {
        FlowError::Template {
            flow: self.name,
            source,
        }
    }
}

/// Pulls the JSON document out of a model reply, tolerating fenced blocks.
pub(crate) fn extract_json_payload(text: &str) -> Result<Value, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("model reply was empty; expected JSON output".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let mut cursor = 0usize;
    while let Some(open_rel) = text[cursor..].find("```") {
        let open = cursor + open_rel;
        let after_open = &text[open + 3..];
        let header_end_rel = after_open.find('\n').unwrap_or(after_open.len());
        let header = after_open[..header_end_rel].trim();
        let block_start = (open + 3 + header_end_rel + 1).min(text.len());
        let Some(close_rel) = text[block_start..].find("```") else {
            break;
        };
        let close = block_start + close_rel;
        cursor = close + 3;

        if !(header.is_empty() || header.eq_ignore_ascii_case("json")) {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(text[block_start..close].trim()) {
            return Ok(value);
        }
    }

    Err("model reply did not contain parseable JSON content".to_string())
}

pub(crate) fn validate_json_against_schema(schema: &Value, payload: &Value) -> Result<(), String> {
    let validator =
        validator_for(schema).map_err(|error| format!("invalid output schema: {error}"))?;
    let mut errors = validator.iter_errors(payload);
    if let Some(first) = errors.next() {
        return Err(format!("output schema validation failed: {first}"));
    }
    Ok(())
}
