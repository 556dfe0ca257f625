use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    tracing::{debug, trace, warn},
};

use crate::{
    error::{InvokeError, Result},
    provider::LlmProvider,
};

/// OpenAI chat-completions backend, surfaced to users as "ChatGPT".
pub struct OpenAiProvider {
    api_key: Secret<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: Secret<String>, model: String, base_url: String, timeout: Duration) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: crate::shared_http_client().clone(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a chat-completions body.
pub fn extract_reply(body: &str) -> Result<String> {
    let resp: ChatResponse =
        serde_json::from_str(body).map_err(|e| InvokeError::malformed(e.to_string()))?;
    resp.choices
        .into_iter()
        .next()
        .ok_or_else(|| InvokeError::malformed("no choices"))?
        .message
        .ok_or_else(|| InvokeError::malformed("choice has no message"))?
        .content
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| InvokeError::malformed("message has no content"))
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn id(&self) -> &str {
        &self.model
    }

    async fn generate_reply(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "openai chat request");

        let http_resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| InvokeError::transport(e, self.timeout))?;

        let status = http_resp.status();
        let text = http_resp
            .text()
            .await
            .map_err(|e| InvokeError::transport(e, self.timeout))?;

        if !status.is_success() {
            warn!(status = %status, body = %text, "openai API error");
            return Err(InvokeError::Status { status, body: text });
        }

        trace!(response = %text, "openai raw response");
        extract_reply(&text)
    }
}
