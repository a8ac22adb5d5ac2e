//! Model client abstraction.

use std::collections::VecDeque;
use std::sync::Mutex;

use thiserror::Error;

/// Errors raised by a language-model backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Cannot reach model endpoint: {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Model endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Could not parse model response: {0}")]
    ResponseParsing(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Model unavailable: {0}")]
    Unavailable(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// A text-generation backend.
///
/// Implementations may block on network I/O and may fail; callers are
/// expected to degrade gracefully rather than abort the conversation turn.
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt` under the given system instructions.
    fn generate(&self, system: &str, prompt: &str) -> ModelResult<String>;

    /// Identifier used in logs.
    fn name(&self) -> &str {
        "model"
    }
}

/// Deterministic model for tests and offline runs.
///
/// Responses are served in the order they were queued. Once the queue is
/// drained the fallback response is returned, or `Unavailable` if none is set.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<ModelResult<String>>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    /// Create a model that answers with `responses` in order.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a model that always fails, as if the endpoint were down.
    pub fn unavailable() -> Self {
        Self::new(Vec::<String>::new())
    }

    /// Answer with `response` whenever the queue is empty.
    pub fn with_fallback(mut self, response: impl Into<String>) -> Self {
        self.fallback = Some(response.into());
        self
    }

    /// Queue a failure to be returned by the next call.
    pub fn push_failure(&self, error: ModelError) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Err(error));
        }
    }

    /// Prompts received so far, in call order.
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl LanguageModel for ScriptedModel {
    fn generate(&self, _system: &str, prompt: &str) -> ModelResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let next = self
            .responses
            .lock()
            .map_err(|_| ModelError::Unavailable("scripted model lock poisoned".into()))?
            .pop_front();

        match next {
            Some(response) => response,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ModelError::Unavailable("no scripted response left".into())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
