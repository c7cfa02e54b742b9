//! Chat session — the single state object behind the chat widget.
//!
//! DESIGN
//! ======
//! Owns the conversation, the reveal buffer, and the in-flight turn. The
//! driver feeds it events (user input, a completed request, timer ticks)
//! and renders whatever it exposes; nothing else mutates chat state.
//!
//! At most one reply is outstanding: input is refused from the moment a
//! prompt is accepted until its reply has been committed (or has failed).
//! Each accepted prompt gets a turn number, and outcomes for any other turn
//! are discarded, which is what makes `reset` safe while a request is in
//! flight.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::conversation::{Conversation, ConversationError, Message};
use crate::error::ErrorCode;
use crate::format::{Formatter, escape_markup};
use crate::llm::{LlmError, Reply};
use crate::persona::Persona;
use crate::reveal::{Reveal, RevealError, Tick};

/// Shown in place of a reply when the completion request fails.
pub const TRANSPORT_ERROR_MESSAGE: &str = "Error fetching chat response";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("message is empty")]
    EmptyInput,
    #[error("still replying to the previous message")]
    ReplyPending,
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "E_EMPTY_INPUT",
            Self::ReplyPending => "E_REPLY_PENDING",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::ReplyPending)
    }
}

impl From<ConversationError> for SessionError {
    fn from(e: ConversationError) -> Self {
        match e {
            ConversationError::EmptyPrompt => Self::EmptyInput,
        }
    }
}

/// An accepted prompt that now needs a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub turn: u64,
    pub text: String,
}

/// What a reply outcome did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// The reply is formatted and now revealing.
    Revealing,
    /// The request failed; an error message was committed.
    Failed,
    /// A reveal was already running, so the reply was committed whole.
    Committed,
    /// The outcome belonged to an abandoned turn and was dropped.
    Stale,
}

// =============================================================================
// SESSION
// =============================================================================

pub struct ChatSession {
    persona: Arc<Persona>,
    formatter: Formatter,
    conversation: Conversation,
    reveal: Reveal,
    turn: u64,
    awaiting: Option<u64>,
}

impl ChatSession {
    #[must_use]
    pub fn new(persona: Persona, formatter: Formatter) -> Self {
        let conversation = Conversation::new(escape_markup(&persona.greeting()));
        Self { persona: Arc::new(persona), formatter, conversation, reveal: Reveal::new(), turn: 0, awaiting: None }
    }

    /// Accept a user prompt and hand back what must be sent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyInput`] for blank input and
    /// [`SessionError::ReplyPending`] while a reply is outstanding. Nothing is
    /// appended in either case.
    pub fn submit(&mut self, input: &str) -> Result<PendingReply, SessionError> {
        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if self.is_typing() {
            return Err(SessionError::ReplyPending);
        }
        self.conversation.append_user_message(input)?;
        self.turn += 1;
        self.awaiting = Some(self.turn);
        info!(turn = self.turn, prompt_len = input.len(), "session: prompt accepted");
        Ok(PendingReply { turn: self.turn, text: input.to_owned() })
    }

    /// Apply the outcome of the completion request for `turn`.
    pub fn receive(&mut self, turn: u64, outcome: Result<Reply, LlmError>) -> Received {
        if self.awaiting != Some(turn) {
            debug!(turn, "session: dropping reply for abandoned turn");
            return Received::Stale;
        }
        self.awaiting = None;

        match outcome {
            Ok(reply) => {
                let markup = self.formatter.format_reply(&reply);
                match self.reveal.start(markup) {
                    Ok(()) => Received::Revealing,
                    Err(RevealError::InProgress { rejected }) => {
                        warn!(turn, "session: reveal already running, committing reply without reveal");
                        self.conversation.append_assistant_message(rejected);
                        Received::Committed
                    }
                }
            }
            Err(e) => {
                warn!(
                    turn,
                    error = %e,
                    code = e.error_code(),
                    transport = e.is_transport(),
                    status = ?e.status(),
                    "session: completion request failed"
                );
                self.conversation.append_assistant_message(TRANSPORT_ERROR_MESSAGE);
                Received::Failed
            }
        }
    }

    /// Advance the reveal by one step, committing the reply when it is done.
    pub fn tick(&mut self) -> Tick {
        let tick = self.reveal.tick();
        if let Tick::Complete(full) = &tick {
            self.conversation.append_assistant_message(full.clone());
            debug!(turn = self.turn, len = full.len(), "session: reply committed");
        }
        tick
    }

    /// Start over: greeting only, no reveal, any in-flight reply ignored.
    pub fn reset(&mut self) {
        if self.reveal.cancel() {
            debug!(turn = self.turn, "session: reveal cancelled by reset");
        }
        self.awaiting = None;
        self.conversation.reset();
        info!("session: reset");
    }

    /// True from accepted prompt until the reply is committed or has failed.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.awaiting.is_some() || self.reveal.is_revealing()
    }

    #[must_use]
    pub fn is_revealing(&self) -> bool {
        self.reveal.is_revealing()
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    #[must_use]
    pub fn reveal_buffer(&self) -> &str {
        self.reveal.buffer()
    }

    /// Shared handle for building requests off the session.
    #[must_use]
    pub fn persona(&self) -> Arc<Persona> {
        Arc::clone(&self.persona)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
