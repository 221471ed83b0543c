//! In-memory session store.
//!
//! All state lives behind a single mutex. Every public operation takes the
//! lock once, so an append and the eviction it triggers form one critical
//! section and concurrent callers never observe a half-trimmed history.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, TimeDelta, Utc};
use habla_types::{Message, Role};
use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::error::SessionError;

/// A snapshot of one conversation.
///
/// Returned by value from the store; mutating it has no effect on the
/// stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// Ordered history. `history[0]` is always the system directive.
    pub history: Vec<Message>,
    pub created_at: DateTime<Utc>,
    /// Last time a message was added or the history was cleared.
    pub last_active: DateTime<Utc>,
}

impl Session {
    fn seeded(id: &str, system_message: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            history: vec![Message::system(system_message)],
            created_at: now,
            last_active: now,
        }
    }

    /// Number of non-system-directive messages in the history.
    pub fn message_count(&self) -> usize {
        self.history.len().saturating_sub(1)
    }
}

/// Process-wide store of conversation sessions.
///
/// Cloning is cheap and every clone shares the same sessions, so the store
/// can be placed directly into server state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    system_message: Arc<str>,
    max_length: usize,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            system_message: Arc::from(config.system_message),
            max_length: config.max_length.max(1),
        }
    }

    /// The bound on history length, system directive included.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // Every mutation restores the invariants before it can
                // panic, so the map behind a poisoned lock is still valid.
                error!("session store lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Returns the session for `session_id`, creating it with a history of
    /// just the system directive if the id is unseen.
    pub fn create_or_get(&self, session_id: &str) -> Session {
        let mut sessions = self.lock();
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                info!(session_id, "created conversation session");
                Session::seeded(session_id, &self.system_message)
            })
            .clone()
    }

    /// Appends a message whose role is given as its wire label.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidRole`] if `role` is not `system`,
    /// `user` or `assistant`. The store is left untouched in that case.
    pub fn add_message(
        &self,
        session_id: &str,
        role: &str,
        content: impl Into<String>,
    ) -> Result<(), SessionError> {
        let role: Role = role.parse()?;
        self.push(session_id, Message::new(role, content));
        Ok(())
    }

    /// Appends an already-typed message, creating the session if needed and
    /// evicting the oldest non-system messages beyond the bound.
    pub fn push(&self, session_id: &str, message: Message) {
        let mut sessions = self.lock();
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                info!(session_id, "created conversation session");
                Session::seeded(session_id, &self.system_message)
            });

        session.history.push(message);
        session.last_active = Utc::now();

        if session.history.len() > self.max_length {
            let excess = session.history.len() - self.max_length;
            session.history.drain(1..=excess);
            debug!(
                session_id,
                evicted = excess,
                "evicted oldest messages from conversation"
            );
        }
    }

    /// Returns a copy of the full history, or just the system directive for
    /// an unseen id. Never creates a session and never evicts.
    pub fn get_conversation(&self, session_id: &str) -> Vec<Message> {
        let sessions = self.lock();
        match sessions.get(session_id) {
            Some(session) => session.history.clone(),
            None => vec![Message::system(&*self.system_message)],
        }
    }

    /// Number of messages after the system directive; 0 for an unseen id.
    pub fn get_message_count(&self, session_id: &str) -> usize {
        self.lock()
            .get(session_id)
            .map_or(0, Session::message_count)
    }

    /// Resets an existing session's history to just the system directive.
    /// Unseen ids are left unseen.
    pub fn clear_conversation(&self, session_id: &str) {
        let mut sessions = self.lock();
        if let Some(session) = sessions.get_mut(session_id) {
            session.history.truncate(1);
            session.last_active = Utc::now();
            info!(session_id, "cleared conversation");
        }
    }

    /// Removes the session entirely. Returns `true` if it existed.
    pub fn delete_session(&self, session_id: &str) -> bool {
        let removed = self.lock().remove(session_id).is_some();
        if removed {
            info!(session_id, "deleted conversation session");
        }
        removed
    }

    /// Snapshot of the ids currently tracked.
    pub fn get_active_sessions(&self) -> HashSet<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every session whose last activity is older than `cutoff`.
    /// Returns how many were removed.
    pub fn prune_inactive_since(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| session.last_active >= cutoff);
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(count = pruned, "pruned idle conversation sessions");
        }
        pruned
    }

    /// Drops every session idle for longer than `max_idle`.
    pub fn prune_idle(&self, max_idle: std::time::Duration) -> usize {
        // An idle window too large for chrono can never elapse.
        let Ok(max_idle) = TimeDelta::from_std(max_idle) else {
            return 0;
        };
        match Utc::now().checked_sub_signed(max_idle) {
            Some(cutoff) => self.prune_inactive_since(cutoff),
            None => 0,
        }
    }
}
