//! Shared types for the Habla voice-chat server.
//!
//! This crate holds the vocabulary every other Habla crate speaks: the
//! closed set of conversation roles, the [`Message`] value stored in session
//! histories and sent to the chat model, and the fixed catalogs of synthesis
//! voices and transcription languages offered to clients.
//!
//! It has no knowledge of sessions, HTTP or external services, which keeps
//! the dependency graph flat: `habla-session`, `habla-voice` and
//! `habla-server` all depend on it and on nothing else inside the workspace
//! for shared definitions.

pub mod voice;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use voice::{
    find_voice, is_supported_language, voices_by_country, voices_by_gender, LanguageOption,
    VoiceGender, VoiceOption, DEFAULT_VOICE, LANGUAGES, VOICES,
};

/// The author of a message in a conversation.
///
/// This is a closed enumeration: anything outside these three roles is
/// rejected at the boundary with [`ParseRoleError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The fixed directive steering the chat model.
    System,
    /// A message typed or spoken by the person using the app.
    User,
    /// A reply produced by the chat model.
    Assistant,
}

impl Role {
    /// Returns the wire label for this role, as understood by the chat API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid role: {0:?} (expected system, user or assistant)")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// A single entry in a conversation history.
///
/// Messages are values: once appended to a history they are never edited,
/// only evicted. Serializes to the `{"role": .., "content": ..}` shape the
/// chat API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
