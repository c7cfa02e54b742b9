//! Persona context — the static "about me" profile behind the assistant.
//!
//! DESIGN
//! ======
//! The profile is opaque JSON, read once at startup and serialized verbatim
//! into the system instruction of every request. Only `name` and the
//! optional `greeting` are interpreted; everything else is the model's
//! business.

use std::path::Path;

use serde_json::Value;

const SCOPE_DIRECTIVE: &str = "If not, politely decline to answer.";
const FORMAT_DIRECTIVE: &str = "Format the text by replacing asterisks with bold text, split long texts into \
                                smaller paragraphs using double line breaks, and ensure only project and social \
                                media links are clickable.";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PersonaError {
    #[error("failed to read persona file {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("persona profile is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("persona profile must be a JSON object")]
    NotAnObject,
    #[error("persona has no name; set \"name\" in the profile or pass an override")]
    MissingName,
}

// =============================================================================
// PERSONA
// =============================================================================

/// Identity and background the assistant speaks for. Never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    name: String,
    profile: Value,
}

impl Persona {
    /// Read a persona profile from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a [`PersonaError`] if the file cannot be read, is not a JSON
    /// object, or carries no usable name.
    pub fn load(path: &Path, name_override: Option<String>) -> Result<Self, PersonaError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| PersonaError::Io { path: path.display().to_string(), source })?;
        let profile: Value = serde_json::from_str(&raw)?;
        Self::from_profile(profile, name_override)
    }

    /// Build a persona from an already-parsed profile.
    ///
    /// # Errors
    ///
    /// Returns [`PersonaError::NotAnObject`] or [`PersonaError::MissingName`].
    pub fn from_profile(profile: Value, name_override: Option<String>) -> Result<Self, PersonaError> {
        if !profile.is_object() {
            return Err(PersonaError::NotAnObject);
        }
        let name = name_override
            .or_else(|| profile.get("name").and_then(Value::as_str).map(str::to_owned))
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .ok_or(PersonaError::MissingName)?;
        Ok(Self { name, profile })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn profile(&self) -> &Value {
        &self.profile
    }

    /// Opening assistant message seeded into every fresh conversation.
    #[must_use]
    pub fn greeting(&self) -> String {
        if let Some(greeting) = self
            .profile
            .get("greeting")
            .and_then(Value::as_str)
            .filter(|g| !g.trim().is_empty())
        {
            return greeting.to_owned();
        }
        format!(
            "Hi, I'm {}. How can I assist you today? Would you like to talk about my projects or the \
             technologies I work with?",
            self.name
        )
    }

    /// Substituted when the endpoint answers with nothing usable.
    #[must_use]
    pub fn fallback_reply(&self) -> String {
        format!("I can only answer questions related to {}.", self.name)
    }

    /// System-role instruction sent ahead of every user utterance.
    #[must_use]
    pub fn system_instruction(&self) -> String {
        // Value's Display is compact JSON and cannot fail.
        format!(
            "You are {name}. Here is some information about you: {profile}. Respond ONLY if the user's \
             question is directly related to {name}. {SCOPE_DIRECTIVE} {FORMAT_DIRECTIVE}",
            name = self.name,
            profile = self.profile,
        )
    }
}

#[cfg(test)]
#[path = "persona_test.rs"]
mod tests;
