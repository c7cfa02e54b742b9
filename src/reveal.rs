//! Reveal animation — typed-out disclosure of an already-known reply.
//!
//! DESIGN
//! ======
//! `Idle -> Revealing -> Idle`. Each tick moves exactly one character from
//! the full text into the visible buffer. The tick that finds the buffer
//! already complete hands the full text back for commit and returns to
//! `Idle`, so every reveal ends in exactly one commit, including the empty
//! one.
//!
//! The state machine is clock-free. Pacing comes from [`reveal_ticker`],
//! an interval the driver owns for the lifetime of one reveal and drops on
//! commit, reset, or exit.

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RevealError {
    /// Hands back the text that was not started.
    #[error("a reply is already being revealed")]
    InProgress { rejected: String },
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Nothing is being revealed.
    Idle,
    /// One more character became visible.
    Advanced(char),
    /// The reveal finished; commit this text.
    Complete(String),
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Revealing {
        full: String,
        // Byte offset of the next character to reveal.
        cursor: usize,
    },
}

#[derive(Debug, Default)]
pub struct Reveal {
    state: State,
    buffer: String,
}

impl Reveal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin revealing `full_text` from an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RevealError::InProgress`] if another reveal has not committed.
    pub fn start(&mut self, full_text: impl Into<String>) -> Result<(), RevealError> {
        let full = full_text.into();
        if self.is_revealing() {
            return Err(RevealError::InProgress { rejected: full });
        }
        self.buffer.clear();
        self.state = State::Revealing { full, cursor: 0 };
        Ok(())
    }

    pub fn tick(&mut self) -> Tick {
        let State::Revealing { full, cursor } = &mut self.state else {
            return Tick::Idle;
        };
        if let Some(ch) = full[*cursor..].chars().next() {
            self.buffer.push(ch);
            *cursor += ch.len_utf8();
            return Tick::Advanced(ch);
        }

        let State::Revealing { full, .. } = std::mem::take(&mut self.state) else {
            return Tick::Idle;
        };
        self.buffer.clear();
        Tick::Complete(full)
    }

    /// Abandon the current reveal. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        self.buffer.clear();
        matches!(std::mem::take(&mut self.state), State::Revealing { .. })
    }

    #[must_use]
    pub fn is_revealing(&self) -> bool {
        matches!(self.state, State::Revealing { .. })
    }

    /// Visible part of the reply being revealed.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }
}

/// Interval pacing one reveal. The first tick fires one period after creation.
#[must_use]
pub fn reveal_ticker(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
#[path = "reveal_test.rs"]
mod tests;
