use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::sleep;

use crate::{
    retry::{
        backoff_delay_ms, is_retryable_http_error, new_request_id, parse_retry_after_ms,
        retry_budget_allows_delay, should_retry_status,
    },
    BriefAiError, ChatRequest, ChatResponse, ChatUsage, ContentBlock, LlmClient, MediaSource,
    Message, MessageRole,
};

pub const DEFAULT_GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GOOGLE_MODEL: &str = "gemini-2.0-flash";

/// JSON-schema keywords the Gemini `responseSchema` dialect rejects.
const UNSUPPORTED_SCHEMA_KEYS: [&str; 2] = ["additionalProperties", "$schema"];

#[derive(Debug, Clone)]
/// Public struct `GoogleConfig` used to build a [`GoogleClient`].
pub struct GoogleConfig {
    pub api_base: String,
    pub api_key: String,
    pub request_timeout_ms: u64,
    pub max_retries: usize,
    pub retry_budget_ms: u64,
}

#[derive(Debug, Clone)]
/// Gemini `generateContent` client.
pub struct GoogleClient {
    client: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleClient {
    pub fn new(config: GoogleConfig) -> Result<Self, BriefAiError> {
        if config.api_key.trim().is_empty() {
            return Err(BriefAiError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self { client, config })
    }

    fn generate_content_url(&self, model: &str) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        if base.contains(":generateContent") {
            return base.replace("{model}", model);
        }
        format!("{base}/models/{model}:generateContent")
    }
}

#[async_trait]
impl LlmClient for GoogleClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BriefAiError> {
        let body = build_generate_content_body(&request);
        let url = self.generate_content_url(&request.model);
        let started = std::time::Instant::now();
        let max_retries = self.config.max_retries;

        for attempt in 0..=max_retries {
            let request_id = new_request_id();
            tracing::debug!(
                model = request.model.as_str(),
                request_id = request_id.as_str(),
                attempt,
                "sending generateContent request"
            );
            let response = self
                .client
                .post(&url)
                .header("x-brief-request-id", request_id)
                .header("x-brief-retry-attempt", attempt.to_string())
                .query(&[("key", self.config.api_key.as_str())])
                .json(&body)
                .send()
                .await;

            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let raw = response.text().await?;
                        return parse_generate_content_response(&raw);
                    }

                    let retry_after_ms = parse_retry_after_ms(response.headers());
                    let raw = response.text().await?;
                    if attempt < max_retries && should_retry_status(status.as_u16()) {
                        let delay_ms = backoff_delay_ms(attempt, retry_after_ms);
                        let elapsed_ms = started.elapsed().as_millis() as u64;
                        if retry_budget_allows_delay(
                            elapsed_ms,
                            delay_ms,
                            self.config.retry_budget_ms,
                        ) {
                            tracing::warn!(
                                status = status.as_u16(),
                                attempt,
                                delay_ms,
                                "retrying generateContent after provider status"
                            );
                            sleep(std::time::Duration::from_millis(delay_ms)).await;
                            continue;
                        }
                    }

                    return Err(BriefAiError::HttpStatus {
                        status: status.as_u16(),
                        body: raw,
                    });
                }
                Err(error) => {
                    let error = error.without_url();
                    if attempt < max_retries && is_retryable_http_error(&error) {
                        let delay_ms = backoff_delay_ms(attempt, None);
                        let elapsed_ms = started.elapsed().as_millis() as u64;
                        if retry_budget_allows_delay(
                            elapsed_ms,
                            delay_ms,
                            self.config.retry_budget_ms,
                        ) {
                            tracing::warn!(attempt, delay_ms, %error, "retrying generateContent after transport error");
                            sleep(std::time::Duration::from_millis(delay_ms)).await;
                            continue;
                        }
                    }
                    return Err(BriefAiError::from(error));
                }
            }
        }

        Err(BriefAiError::InvalidResponse(
            "request retry loop terminated unexpectedly".to_string(),
        ))
    }
}

fn build_generate_content_body(request: &ChatRequest) -> Value {
    let system = extract_system_text(&request.messages);
    let contents = to_google_contents(&request.messages);

    let mut body = json!({
        "contents": contents,
    });

    if !system.is_empty() {
        body["systemInstruction"] = json!({
            "parts": [{ "text": system }],
        });
    }

    let wants_generation_config = request.json_mode
        || request.response_schema.is_some()
        || request.temperature.is_some()
        || request.max_tokens.is_some();
    if wants_generation_config {
        let mut generation_config = json!({});
        if request.json_mode || request.response_schema.is_some() {
            generation_config["responseMimeType"] = json!("application/json");
        }
        if let Some(schema) = request.response_schema.as_ref() {
            generation_config["responseSchema"] = sanitize_google_schema(schema);
        }
        if let Some(temperature) = request.temperature {
            generation_config["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }
        body["generationConfig"] = generation_config;
    }

    body
}

fn extract_system_text(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|message| message.role == MessageRole::System)
        .map(Message::text_content)
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn sanitize_google_schema(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, nested) in map {
                if UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str()) {
                    continue;
                }
                sanitized.insert(key.clone(), sanitize_google_schema(nested));
            }
            Value::Object(sanitized)
        }
        Value::Array(values) => Value::Array(values.iter().map(sanitize_google_schema).collect()),
        _ => value.clone(),
    }
}

fn to_google_contents(messages: &[Message]) -> Value {
    Value::Array(
        messages
            .iter()
            .filter_map(|message| {
                let role = match message.role {
                    MessageRole::System => return None,
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                let parts = to_google_parts(message);
                if parts.is_empty() {
                    return None;
                }
                Some(json!({
                    "role": role,
                    "parts": parts,
                }))
            })
            .collect(),
    )
}

fn to_google_parts(message: &Message) -> Vec<Value> {
    message
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } if text.trim().is_empty() => None,
            ContentBlock::Text { text } => Some(json!({ "text": text })),
            ContentBlock::Media { source } => Some(to_google_media_part(source)),
        })
        .collect()
}

fn to_google_media_part(source: &MediaSource) -> Value {
    match source {
        MediaSource::Url { url, mime_type } => json!({
            "fileData": {
                "mimeType": mime_type,
                "fileUri": url,
            }
        }),
        MediaSource::Base64 { mime_type, data } => json!({
            "inlineData": {
                "mimeType": mime_type,
                "data": data,
            }
        }),
    }
}

fn parse_generate_content_response(raw: &str) -> Result<ChatResponse, BriefAiError> {
    let parsed: GenerateContentResponse = serde_json::from_str(raw)?;
    if let Some(feedback) = parsed.prompt_feedback.as_ref() {
        if let Some(reason) = feedback.block_reason.as_deref() {
            return Err(BriefAiError::InvalidResponse(format!(
                "prompt was blocked by the provider: {reason}"
            )));
        }
    }
    let candidate = parsed
        .candidates
        .and_then(|mut candidates| candidates.drain(..).next())
        .ok_or_else(|| {
            BriefAiError::InvalidResponse("response contained no candidates".to_string())
        })?;

    let blocks = candidate
        .content
        .and_then(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .filter(|text| !text.trim().is_empty())
        .map(ContentBlock::text)
        .collect::<Vec<_>>();

    let usage = parsed
        .usage_metadata
        .map(|usage| ChatUsage {
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            total_tokens: usage.total_token_count.unwrap_or(0),
        })
        .unwrap_or_default();

    Ok(ChatResponse {
        message: Message {
            role: MessageRole::Assistant,
            content: blocks,
        },
        finish_reason: candidate.finish_reason,
        usage,
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<GenerateContentCandidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<GeneratePromptFeedback>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GenerateContentUsage>,
}

#[derive(Debug, Deserialize)]
struct GeneratePromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentCandidate {
    content: Option<GenerateContentContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentContent {
    parts: Option<Vec<GenerateContentPart>>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentUsage {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u64>,
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{build_generate_content_body, parse_generate_content_response};
    use crate::{ChatRequest, ContentBlock, MediaSource, Message};

    fn request(messages: Vec<Message>) -> ChatRequest {
        ChatRequest {
            model: "gemini-2.0-flash".to_string(),
            messages,
            json_mode: false,
            response_schema: None,
            max_tokens: None,
            temperature: None,
        }
    }

    #[test]
    fn unit_serializes_system_instruction_and_media_parts() {
        let body = build_generate_content_body(&request(vec![
            Message::system("You are an expert legal assistant."),
            Message::user_blocks(vec![
                ContentBlock::text("Embed this document"),
                ContentBlock::media(MediaSource::Base64 {
                    mime_type: "text/plain".to_string(),
                    data: "aGVsbG8=".to_string(),
                }),
                ContentBlock::media(MediaSource::Url {
                    url: "https://storage.example/doc.pdf".to_string(),
                    mime_type: "application/pdf".to_string(),
                }),
            ]),
        ]));

        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are an expert legal assistant."
        );
        assert_eq!(body["contents"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "text/plain"
        );
        assert_eq!(
            body["contents"][0]["parts"][2]["fileData"]["fileUri"],
            "https://storage.example/doc.pdf"
        );
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn functional_response_schema_enables_json_mode_and_strips_unsupported_keys() {
        let mut chat = request(vec![Message::user("draft")]);
        chat.response_schema = Some(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {"summary": {"type": "string"}},
            "required": ["summary"],
            "additionalProperties": false
        }));
        chat.temperature = Some(0.2);

        let body = build_generate_content_body(&chat);
        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert!(!config["responseSchema"]
            .to_string()
            .contains("additionalProperties"));
        assert!(config["responseSchema"].get("$schema").is_none());
        assert_eq!(config["responseSchema"]["required"][0], "summary");
        let temperature = config["temperature"].as_f64().expect("temperature");
        assert!((temperature - 0.2).abs() < 1e-6);
    }

    #[test]
    fn parses_text_and_usage_from_response() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "{\"summary\":\"S\"}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 8,
                "candidatesTokenCount": 4,
                "totalTokenCount": 12
            }
        }"#;

        let response = parse_generate_content_response(raw).expect("response must parse");
        assert_eq!(response.message.text_content(), "{\"summary\":\"S\"}");
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(response.usage.total_tokens, 12);
    }

    #[test]
    fn regression_blocked_prompt_surfaces_invalid_response() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let error = parse_generate_content_response(raw).expect_err("blocked prompt must fail");
        assert!(error.to_string().contains("SAFETY"));
    }

    #[test]
    fn regression_missing_candidates_is_invalid_response() {
        let error = parse_generate_content_response(r#"{"candidates": []}"#)
            .expect_err("empty candidates must fail");
        assert!(error.to_string().contains("no candidates"));
    }
}
