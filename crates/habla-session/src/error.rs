//! Error types for the session store.

/// Errors surfaced by [`SessionStore`](crate::SessionStore) operations.
///
/// Only contract violations are errors. A missing session is represented as
/// data (a history holding just the system directive), never as a variant
/// here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// `add_message` was called with a role outside system/user/assistant.
    #[error("invalid message role: {0:?}")]
    InvalidRole(String),
}

impl From<habla_types::ParseRoleError> for SessionError {
    fn from(err: habla_types::ParseRoleError) -> Self {
        Self::InvalidRole(err.0)
    }
}
