//! Persona chat — a scripted portfolio persona answering questions through a
//! remote completion endpoint, with the reply typed out character by
//! character.
//!
//! ARCHITECTURE
//! ============
//! - [`session::ChatSession`] owns all chat state: the [`conversation`], the
//!   [`reveal`] buffer, and the single in-flight turn.
//! - [`llm`] builds the stateless two-message request and talks to the
//!   endpoint behind the [`llm::CompletionBackend`] seam.
//! - [`format`] escapes the reply and applies bold, paragraph, and
//!   allow-listed link rules.
//! - [`render`] and [`terminal`] are the display side.

pub mod conversation;
pub mod error;
pub mod format;
pub mod llm;
pub mod persona;
pub mod render;
pub mod reveal;
pub mod session;
pub mod terminal;
