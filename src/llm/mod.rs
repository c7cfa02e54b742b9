//! LLM — completion client for the persona chat.
//!
//! DESIGN
//! ======
//! Every request is stateless: a system instruction built from the persona
//! plus the single latest user utterance. Earlier turns are never sent, so
//! the model answers each question on its own. The HTTP call sits behind
//! [`CompletionBackend`] so the session can be driven by a mock in tests.
//!
//! The endpoint normally answers with the completion as a plain text body.
//! A body in chat-completion JSON shape (`choices[0].message.content`) is
//! also accepted, which lets the client talk to a bare OpenAI-compatible
//! proxy without a text-unwrapping layer in between.

pub mod config;
pub mod types;

use serde_json::Value;
use tracing::{debug, info};

use crate::persona::Persona;
use config::LlmConfig;
pub use types::{ChatMessage, CompletionBackend, CompletionRequest, LlmError, Reply, Role};

// =============================================================================
// HTTP BACKEND
// =============================================================================

/// reqwest-backed transport posting to the configured chat endpoint.
pub struct HttpBackend {
    http: reqwest::Client,
    url: String,
}

impl HttpBackend {
    /// Build the HTTP transport from endpoint config.
    ///
    /// No request timeout is set: the caller waits for the full body.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, url: config.endpoint_url() })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl CompletionBackend for HttpBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if !status.is_success() {
            return Err(LlmError::ApiResponse { status: status.as_u16(), body: text });
        }
        Ok(text)
    }
}

// =============================================================================
// REQUEST / REPLY
// =============================================================================

/// Build the two-entry instruction context for one user utterance.
#[must_use]
pub fn build_request(persona: &Persona, user_text: &str) -> CompletionRequest {
    CompletionRequest {
        messages: vec![
            ChatMessage { role: Role::System, content: persona.system_instruction() },
            ChatMessage { role: Role::User, content: user_text.to_owned() },
        ],
    }
}

/// Ask the endpoint for a reply to `user_text` in the voice of `persona`.
///
/// One outbound call, no retry. An empty completion is replaced by the
/// persona's fallback sentence rather than reported as an error.
///
/// # Errors
///
/// Returns the backend's [`LlmError`] on any transport failure.
pub async fn request_reply(
    backend: &dyn CompletionBackend,
    persona: &Persona,
    user_text: &str,
) -> Result<Reply, LlmError> {
    let request = build_request(persona, user_text);
    info!(prompt_len = user_text.len(), "llm: requesting reply");
    let body = backend.complete(&request).await?;
    debug!(body_len = body.len(), "llm: reply received");
    Ok(extract_reply(&body, &persona.fallback_reply()))
}

/// Pull the completion out of a successful response body.
#[must_use]
pub fn extract_reply(body: &str, fallback: &str) -> Reply {
    let text_or_fallback = |text: &str| {
        if text.trim().is_empty() {
            Reply::Text(fallback.to_owned())
        } else {
            Reply::Text(text.to_owned())
        }
    };

    let Ok(root) = serde_json::from_str::<Value>(body.trim()) else {
        return text_or_fallback(body);
    };
    if root.get("choices").is_none() {
        return text_or_fallback(body);
    }

    match root.pointer("/choices/0/message/content") {
        Some(Value::String(text)) => text_or_fallback(text.as_str()),
        None | Some(Value::Null) => Reply::Text(fallback.to_owned()),
        Some(other) => Reply::Structured(other.clone()),
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
