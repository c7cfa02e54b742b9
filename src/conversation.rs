//! Conversation store — the ordered turns of one chat session.
//!
//! DESIGN
//! ======
//! Append-only between resets. A fresh store always holds exactly one
//! message, the assistant greeting. Messages are never edited or reordered;
//! append order is the display order.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversationError {
    #[error("user message must not be blank")]
    EmptyPrompt,
}

// =============================================================================
// MESSAGE
// =============================================================================

/// One turn. Exactly one of `prompt` / `response` is non-empty.
///
/// `prompt` is the user's raw text. `response` is display markup produced by
/// the formatter (or a fixed plain sentence that needs no escaping).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    prompt: String,
    response: String,
    is_user: bool,
}

impl Message {
    fn user(prompt: String) -> Self {
        Self { prompt, response: String::new(), is_user: true }
    }

    fn assistant(response: String) -> Self {
        Self { prompt: String::new(), response, is_user: false }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        self.is_user
    }
}

// =============================================================================
// CONVERSATION
// =============================================================================

#[derive(Debug, Clone)]
pub struct Conversation {
    greeting: String,
    messages: Vec<Message>,
}

impl Conversation {
    /// New conversation seeded with `greeting` as the first assistant turn.
    #[must_use]
    pub fn new(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        let messages = vec![Message::assistant(greeting.clone())];
        Self { greeting, messages }
    }

    /// Append a user turn. Does not send anything.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::EmptyPrompt`] for blank text; nothing is
    /// appended.
    pub fn append_user_message(&mut self, text: impl Into<String>) -> Result<&Message, ConversationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ConversationError::EmptyPrompt);
        }
        Ok(self.push(Message::user(text)))
    }

    /// Append an assistant turn.
    pub fn append_assistant_message(&mut self, text: impl Into<String>) -> &Message {
        self.push(Message::assistant(text.into()))
    }

    /// Drop every turn and re-seed the greeting.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.messages.push(Message::assistant(self.greeting.clone()));
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true: the greeting is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;
