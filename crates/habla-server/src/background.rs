//! Background tasks for the Habla server.
//!
//! Includes:
//! - Reaping idle conversation sessions (off unless an idle TTL is set).

use crate::AppState;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// One reaper pass: drops sessions idle longer than `ttl` and the model
/// choices left without a session for as long. Returns how many sessions were removed.
pub fn reap_idle_sessions(state: &AppState, ttl: Duration) -> usize {
    let pruned = state.sessions.prune_idle(ttl);
    let forgotten = state.forget_stale_model_choices(ttl);
    if pruned > 0 || forgotten > 0 {
        tracing::info!(
            sessions = pruned,
            model_choices = forgotten,
            remaining = state.sessions.len(),
            "reaped idle sessions"
        );
    }
    pruned
}

/// Starts the idle session reaper.
///
/// Runs indefinitely, checking every `ttl / 2` (clamped to 1..=60 seconds).
pub async fn start_session_reaper(state: Arc<AppState>, ttl_seconds: u64) {
    if ttl_seconds == 0 {
        tracing::warn!("session reaper disabled (ttl=0)");
        return;
    }

    let interval_seconds = (ttl_seconds / 2).clamp(1, 60);
    let interval = Duration::from_secs(interval_seconds);
    let ttl = Duration::from_secs(ttl_seconds);

    tracing::info!(ttl_seconds, interval_seconds, "starting idle session reaper");

    loop {
        sleep(interval).await;
        reap_idle_sessions(&state, ttl);
    }
}
