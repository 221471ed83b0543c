//! Unit tests for the session store.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use habla_types::{Message, Role};

use crate::config::{SessionConfig, DEFAULT_MAX_CONVERSATION_LENGTH, DEFAULT_SYSTEM_MESSAGE};
use crate::error::SessionError;
use crate::store::SessionStore;

const DIRECTIVE: &str = "Responde siempre en español.";

fn store_with_max(max_length: usize) -> SessionStore {
    SessionStore::new(SessionConfig::new(max_length, DIRECTIVE))
}

fn store() -> SessionStore {
    store_with_max(DEFAULT_MAX_CONVERSATION_LENGTH)
}

// ── Seeding ──────────────────────────────────────────────────────────

#[test]
fn unseen_session_reads_as_system_directive_only() {
    let store = store();

    let history = store.get_conversation("never-seen");

    assert_eq!(history, vec![Message::system(DIRECTIVE)]);
    assert_eq!(store.get_message_count("never-seen"), 0);
}

#[test]
fn reading_an_unseen_session_does_not_create_it() {
    let store = store();

    store.get_conversation("ghost");
    store.get_message_count("ghost");

    assert!(store.get_active_sessions().is_empty());
}

#[test]
fn create_or_get_is_idempotent() {
    let store = store();

    let first = store.create_or_get("abc");
    store.add_message("abc", "user", "Hola").unwrap();
    let second = store.create_or_get("abc");

    assert_eq!(first.history, vec![Message::system(DIRECTIVE)]);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.history.len(), 2);
    assert_eq!(store.get_active_sessions().len(), 1);
}

#[test]
fn default_config_uses_spanish_directive() {
    let store = SessionStore::new(SessionConfig::default());

    assert_eq!(store.max_length(), 20);
    assert_eq!(store.system_message(), DEFAULT_SYSTEM_MESSAGE);
    assert!(store.system_message().contains("español"));
}

// ── Appending ────────────────────────────────────────────────────────

#[test]
fn user_and_assistant_turn_is_recorded_in_order() {
    let store = store();

    store.add_message("s1", "user", "Hola").unwrap();
    store
        .add_message("s1", "assistant", "Hola, ¿cómo estás?")
        .unwrap();

    assert_eq!(
        store.get_conversation("s1"),
        vec![
            Message::system(DIRECTIVE),
            Message::user("Hola"),
            Message::assistant("Hola, ¿cómo estás?"),
        ]
    );
    assert_eq!(store.get_message_count("s1"), 2);
}

#[test]
fn invalid_role_is_rejected_without_touching_state() {
    let store = store();
    store.add_message("s1", "user", "Hola").unwrap();
    let before = store.get_conversation("s1");

    let err = store.add_message("s1", "narrator", "x").unwrap_err();

    assert_eq!(err, SessionError::InvalidRole("narrator".to_string()));
    assert_eq!(store.get_conversation("s1"), before);
}

#[test]
fn invalid_role_does_not_create_session() {
    let store = store();

    assert!(store.add_message("fresh", "robot", "x").is_err());
    assert!(store.get_active_sessions().is_empty());
}

#[test]
fn system_message_stays_first_after_every_append() {
    let store = store_with_max(5);

    for i in 0..12 {
        let role = if i % 2 == 0 { "user" } else { "assistant" };
        store.add_message("s1", role, format!("mensaje {i}")).unwrap();

        let history = store.get_conversation("s1");
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history[0].content, DIRECTIVE);
        assert_eq!(store.get_message_count("s1"), history.len() - 1);
    }
}

// ── Eviction ─────────────────────────────────────────────────────────

#[test]
fn overflow_keeps_newest_messages_and_directive() {
    let store = store_with_max(20);

    for i in 0..25 {
        store.add_message("s1", "user", format!("m{i}")).unwrap();
    }

    let history = store.get_conversation("s1");
    assert_eq!(history.len(), 20);
    assert_eq!(history[0], Message::system(DIRECTIVE));

    let kept: Vec<&str> = history[1..].iter().map(|m| m.content.as_str()).collect();
    let expected: Vec<String> = (6..25).map(|i| format!("m{i}")).collect();
    assert_eq!(kept, expected);
}

#[test]
fn eviction_can_split_a_user_assistant_pair() {
    let store = store_with_max(4);

    store.add_message("s1", "user", "p1").unwrap();
    store.add_message("s1", "assistant", "r1").unwrap();
    store.add_message("s1", "user", "p2").unwrap();
    store.add_message("s1", "assistant", "r2").unwrap();

    // Window of three non-system messages: the first question is gone but
    // its answer remains.
    let history = store.get_conversation("s1");
    assert_eq!(history[1], Message::assistant("r1"));
    assert_eq!(history.len(), 4);
}

#[test]
fn max_length_of_zero_is_clamped_to_directive_only() {
    let store = store_with_max(0);

    store.add_message("s1", "user", "Hola").unwrap();

    assert_eq!(store.max_length(), 1);
    assert_eq!(store.get_conversation("s1"), vec![Message::system(DIRECTIVE)]);
    assert_eq!(store.get_message_count("s1"), 0);
}

#[test]
fn reading_never_evicts() {
    let store = store_with_max(3);
    store.add_message("s1", "user", "a").unwrap();
    store.add_message("s1", "assistant", "b").unwrap();

    for _ in 0..5 {
        assert_eq!(store.get_conversation("s1").len(), 3);
    }
}

// ── Clear / delete ───────────────────────────────────────────────────

#[test]
fn clear_resets_to_directive_only() {
    let store = store();
    store.add_message("s1", "user", "Hola").unwrap();
    store.add_message("s1", "assistant", "Buenas").unwrap();

    store.clear_conversation("s1");

    assert_eq!(store.get_conversation("s1"), vec![Message::system(DIRECTIVE)]);
    assert_eq!(store.get_message_count("s1"), 0);
    assert!(store.get_active_sessions().contains("s1"));
}

#[test]
fn clear_on_unseen_session_is_a_no_op() {
    let store = store();

    store.clear_conversation("nobody");

    assert!(store.is_empty());
}

#[test]
fn deleted_session_reads_as_unseen() {
    let store = store();
    store.add_message("s1", "user", "Hola").unwrap();

    assert!(store.delete_session("s1"));
    assert!(!store.delete_session("s1"));

    assert_eq!(store.get_conversation("s1"), vec![Message::system(DIRECTIVE)]);
    assert!(!store.get_active_sessions().contains("s1"));
}

#[test]
fn active_sessions_is_a_snapshot() {
    let store = store();
    store.add_message("a", "user", "uno").unwrap();
    store.add_message("b", "user", "dos").unwrap();

    let snapshot = store.get_active_sessions();
    store.delete_session("a");

    assert_eq!(snapshot.len(), 2);
    assert_eq!(store.len(), 1);
}

#[test]
fn returned_session_is_a_copy() {
    let store = store();
    let mut session = store.create_or_get("s1");

    session.history.push(Message::user("inyectado"));

    assert_eq!(store.get_message_count("s1"), 0);
}

// ── Idle pruning ─────────────────────────────────────────────────────

#[test]
fn prune_drops_sessions_idle_before_cutoff() {
    let store = store();
    store.add_message("old", "user", "Hola").unwrap();

    let cutoff = Utc::now() + chrono::TimeDelta::seconds(1);
    assert_eq!(store.prune_inactive_since(cutoff), 1);
    assert!(store.is_empty());
}

#[test]
fn prune_keeps_recent_sessions() {
    let store = store();
    store.add_message("recent", "user", "Hola").unwrap();

    assert_eq!(store.prune_idle(Duration::from_secs(3600)), 0);
    assert_eq!(store.len(), 1);
}

#[test]
fn prune_with_unrepresentable_window_removes_nothing() {
    let store = store();
    store.add_message("s1", "user", "Hola").unwrap();

    assert_eq!(store.prune_idle(Duration::MAX), 0);
}

// ── Concurrency ──────────────────────────────────────────────────────

#[test]
fn concurrent_appends_are_not_lost() {
    let store = Arc::new(store_with_max(1000));
    let mut handles = Vec::new();

    for t in 0..8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                store
                    .add_message("shared", "user", format!("{t}-{i}"))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.get_message_count("shared"), 400);
}

#[test]
fn concurrent_appends_preserve_bound_and_per_thread_order() {
    let store = Arc::new(store_with_max(64));
    let mut handles = Vec::new();

    for t in 0..4 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                store
                    .add_message("shared", "user", format!("{t}-{i:03}"))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let history = store.get_conversation("shared");
    assert_eq!(history.len(), 64);
    assert_eq!(history[0].role, Role::System);

    for t in 0..4 {
        let prefix = format!("{t}-");
        let mine: Vec<&str> = history
            .iter()
            .filter_map(|m| m.content.strip_prefix(prefix.as_str()))
            .collect();
        let mut sorted = mine.clone();
        sorted.sort_unstable();
        assert_eq!(mine, sorted, "thread {t} messages out of order");
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[test]
fn config_deserializes_with_defaults() {
    let config: SessionConfig = toml::from_str("max_length = 8").unwrap();

    assert_eq!(config.max_length, 8);
    assert_eq!(config.system_message, DEFAULT_SYSTEM_MESSAGE);
    assert_eq!(config.idle_ttl_seconds, None);
}
