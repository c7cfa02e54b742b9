//! Reply formatter — model text to display markup.
//!
//! DESIGN
//! ======
//! The model's text is untrusted. It is escaped first, and only then are the
//! three allowed transformations applied to the escaped text:
//!
//! 1. `**bold**` pairs become `<strong>` (unpaired asterisks stay literal)
//! 2. every period followed by whitespace becomes `.<br><br>`
//! 3. URLs on the link allow-list become anchors opened with `noopener`
//!
//! Because escaping runs first, the only markup in the output is the markup
//! these rules emit. The sentence rule is a plain substitution: decimals and
//! abbreviations are not special, and runs of breaks are expected output.

use regex::{Captures, Regex};
use tracing::warn;

use crate::llm::Reply;

/// Hosts (with optional path prefix) whose links are made clickable.
pub const DEFAULT_LINK_ALLOWLIST: &[&str] = &[
    "senzo-calvin-shinga-portfolio.com",
    "ai-chat-interface.com",
    "ats-friendly-cv-builder-production.up.railway.app",
    "linkedin.com/in/senzo-shinga-a970802a9",
    "github.com/InnoWave620",
];

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ':', '!', '?', ')'];

// Escaped forms of characters that cannot appear in a URL. `&amp;` can.
const URL_TERMINATORS: &[&str] = &["&quot;", "&#39;", "&lt;", "&gt;"];

// What may follow an allow-list entry for the URL to still be on it.
const ENTRY_BOUNDARY: &[char] = &['/', '?', '#', ':'];

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("link allow-list is empty")]
    EmptyAllowList,
    #[error("link pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

// =============================================================================
// FORMATTER
// =============================================================================

/// Compiled formatting rules. Build once per session.
#[derive(Debug, Clone)]
pub struct Formatter {
    bold: Regex,
    sentence_end: Regex,
    links: Regex,
    allowlist: Vec<String>,
}

impl Formatter {
    /// Compile the formatter for the given link allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::EmptyAllowList`] if no usable entry is given.
    pub fn new<S: AsRef<str>>(allowlist: &[S]) -> Result<Self, FormatError> {
        let entries: Vec<String> = allowlist
            .iter()
            .map(|entry| {
                entry
                    .as_ref()
                    .trim()
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .trim_end_matches('/')
                    .to_owned()
            })
            .filter(|entry| !entry.is_empty())
            .collect();
        if entries.is_empty() {
            return Err(FormatError::EmptyAllowList);
        }
        let hosts: Vec<String> = entries.iter().map(|entry| regex::escape(entry)).collect();

        Ok(Self {
            bold: Regex::new(r"\*\*(.*?)\*\*")?,
            sentence_end: Regex::new(r"\.\s")?,
            links: Regex::new(&format!(r"https?://(?:{})[^\s<]*", hosts.join("|")))?,
            allowlist: entries,
        })
    }

    /// Compile the formatter with [`DEFAULT_LINK_ALLOWLIST`].
    ///
    /// # Errors
    ///
    /// Only fails if the built-in patterns fail to compile.
    pub fn with_default_allowlist() -> Result<Self, FormatError> {
        Self::new(DEFAULT_LINK_ALLOWLIST)
    }

    /// Turn raw model text into display markup.
    #[must_use]
    pub fn format(&self, text: &str) -> String {
        let escaped = escape_markup(text);
        let bolded = self.bold.replace_all(&escaped, "<strong>$1</strong>");
        let paragraphs = self.sentence_end.replace_all(&bolded, ".<br><br>");
        self.links
            .replace_all(&paragraphs, |caps: &Captures<'_>| self.linkify(&caps[0]))
            .into_owned()
    }

    /// Format a reply from the completion client.
    ///
    /// Non-text replies are logged and passed through unformatted (still
    /// escaped).
    #[must_use]
    pub fn format_reply(&self, reply: &Reply) -> String {
        match reply {
            Reply::Text(text) => self.format(text),
            Reply::Structured(value) => {
                warn!(kind = json_kind(value), "format: expected text reply, passing through unformatted");
                escape_markup(&value.to_string())
            }
        }
    }

    /// Wrap the URL at the start of `matched`, or leave the text as is when
    /// the URL is not actually on the allow-list.
    fn linkify(&self, matched: &str) -> String {
        let end = URL_TERMINATORS
            .iter()
            .filter_map(|entity| matched.find(entity))
            .min()
            .unwrap_or(matched.len());
        let url = matched[..end].trim_end_matches(TRAILING_PUNCTUATION);
        if !self.is_allowed(url) {
            return matched.to_owned();
        }
        let trailing = &matched[url.len()..];
        format!(r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{url}</a>{trailing}"#)
    }

    /// An entry matches only up to a host or path boundary, so
    /// `example.com` does not cover `example.com.evil.net` or `example.comx`.
    fn is_allowed(&self, url: &str) -> bool {
        let rest = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://")).unwrap_or(url);
        self.allowlist.iter().any(|entry| {
            rest.strip_prefix(entry.as_str())
                .is_some_and(|tail| tail.is_empty() || tail.starts_with(ENTRY_BOUNDARY))
        })
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// =============================================================================
// ESCAPING
// =============================================================================

/// Escape the five markup-significant characters.
#[must_use]
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
