//! OpenAI-compatible chat-completions client (Groq, OpenAI, Ollama `/v1`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::{LanguageModel, ModelError, ModelResult};

/// Blocking HTTP client for a chat-completions endpoint.
pub struct ChatCompletionsClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

impl ChatCompletionsClient {
    /// Create a client for `model` at `base_url` (e.g. `https://api.groq.com/openai/v1`).
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        temperature: f32,
        timeout_secs: u64,
    ) -> ModelResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ModelError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            temperature,
            timeout_secs,
            client,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl LanguageModel for ChatCompletionsClient {
    fn generate(&self, system: &str, prompt: &str) -> ModelResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.temperature,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                ModelError::Connection(self.base_url.clone())
            } else {
                ModelError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ModelError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ModelError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ModelError::EmptyResponse)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
