//! Per-session conversation history for the Habla voice-chat server.
//!
//! A [`SessionStore`] maps opaque session ids to an ordered history of
//! [`Message`](habla_types::Message)s. Every history starts with the
//! configured system directive, and the store keeps each history within
//! [`SessionConfig::max_length`] by evicting the oldest non-system messages
//! first.
//!
//! # Guarantees
//!
//! | Property | Holds |
//! |----------|-------|
//! | `history[0]` is the system directive | after every operation |
//! | `history.len() <= max_length` | after every operation |
//! | per-session append order == call order | yes, appends are serialised |
//! | accessors hand out live references | never, all reads are copies |
//!
//! Absent sessions are never an error: reads of an unknown id behave as if
//! the session held only the system directive. The one failure callers can
//! see is [`SessionError::InvalidRole`].
//!
//! # Eviction
//!
//! Eviction is strict FIFO over non-system messages. It does not look at
//! user/assistant pairing, so a reply can outlive the question it answered
//! once the window slides past it.
//!
//! ```rust,ignore
//! use habla_session::{SessionConfig, SessionStore};
//!
//! let store = SessionStore::new(SessionConfig::default());
//! store.add_message(&session_id, "user", "Hola")?;
//! let history = store.get_conversation(&session_id);
//! ```

mod config;
mod error;
mod store;

pub use config::{SessionConfig, DEFAULT_MAX_CONVERSATION_LENGTH, DEFAULT_SYSTEM_MESSAGE};
pub use error::SessionError;
pub use store::{Session, SessionStore};

#[cfg(test)]
mod tests;
