use std::collections::VecDeque;

use async_trait::async_trait;
use brief_ai::{BriefAiError, ChatRequest, ChatResponse, ChatUsage, LlmClient, Message};
use tokio::sync::Mutex;

/// Replays canned replies and records every request it receives.
pub(crate) struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, BriefAiError>>>,
    pub(crate) requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new(replies: Vec<Result<String, BriefAiError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub(crate) async fn last_prompt(&self) -> String {
        self.requests
            .lock()
            .await
            .last()
            .and_then(|request| request.messages.first())
            .map(Message::text_content)
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BriefAiError> {
        self.requests.lock().await.push(request);
        let reply = self.replies.lock().await.pop_front().ok_or_else(|| {
            BriefAiError::InvalidResponse("scripted client ran out of replies".to_string())
        })?;
        Ok(ChatResponse {
            message: Message::assistant_text(reply?),
            finish_reason: Some("STOP".to_string()),
            usage: ChatUsage::default(),
        })
    }
}
