//! Completion endpoint configuration parsed from environment variables.

use super::types::LlmError;

pub const DEFAULT_CHAT_API_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_CHAT_API_PATH: &str = "/api/chat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub base_url: String,
    pub chat_path: String,
}

impl LlmConfig {
    /// Build typed endpoint config from environment variables.
    ///
    /// Optional:
    /// - `CHAT_API_BASE_URL`: default `http://127.0.0.1:3000`
    /// - `CHAT_API_PATH`: default `/api/chat`
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ConfigParse`] if the base URL is not http(s).
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed endpoint config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ConfigParse`] if the base URL is not http(s).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url(lookup("CHAT_API_BASE_URL").as_deref())?;
        let chat_path = normalize_path(lookup("CHAT_API_PATH").as_deref());
        Ok(Self { base_url, chat_path })
    }

    /// Full URL of the chat-completion endpoint.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url, self.chat_path)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_CHAT_API_BASE_URL.to_string(), chat_path: DEFAULT_CHAT_API_PATH.to_string() }
    }
}

fn parse_base_url(raw: Option<&str>) -> Result<String, LlmError> {
    let url = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_CHAT_API_BASE_URL)
        .trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(LlmError::ConfigParse(format!(
            "unsupported CHAT_API_BASE_URL '{url}' (expected http:// or https://)"
        )));
    }
    Ok(url.to_string())
}

fn normalize_path(raw: Option<&str>) -> String {
    let path = raw.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(DEFAULT_CHAT_API_PATH);
    if path.starts_with('/') { path.to_string() } else { format!("/{path}") }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
