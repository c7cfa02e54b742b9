//! LLM types — wire messages, replies, errors, and the backend seam.
//!
//! The completion endpoint is a proxy in front of the model provider. It
//! accepts role-tagged messages and answers with the completion as a single
//! text body, so the request side is tiny and the reply side is a string.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by completion client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The HTTP request never produced a response (connect, DNS, body read).
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The endpoint returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl LlmError {
    /// `true` for failures of the outbound call itself, as opposed to setup.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ApiRequest(_) | Self::ApiResponse { .. })
    }

    /// HTTP status of the failed call, when the endpoint answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl ErrorCode for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::ApiRequest(_) | Self::ApiResponse { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// MESSAGE TYPES
// =============================================================================

/// Who authored an entry of the instruction context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single role-tagged entry sent to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Request body posted to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
}

/// Completion extracted from a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Usable completion text.
    Text(String),
    /// The endpoint answered with a JSON value that is not text.
    Structured(serde_json::Value),
}

// =============================================================================
// BACKEND TRAIT
// =============================================================================

/// Transport seam for the completion endpoint. Enables mocking in tests.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Post one request and return the raw response body.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails or the status is not a
    /// success.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
