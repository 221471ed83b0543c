//! Habla server library logic.

pub mod api;
pub mod api_models;
pub mod api_voice;
pub mod background;
pub mod config;
pub mod middleware;
pub mod ollama;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::Config;
use habla_session::SessionStore;
use habla_voice::{SttService, TtsService};
use ollama::OllamaClient;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// A model picked by one session, with the time it was last set.
#[derive(Debug, Clone)]
pub struct ModelChoice {
    pub model: String,
    pub touched: Instant,
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Conversation histories keyed by session id.
    pub sessions: SessionStore,
    /// Model picked by each session through `/api/change-model`.
    ///
    /// Uses `std::sync::RwLock`: every acquisition is a brief map operation
    /// that never spans an `.await`.
    pub model_choices: Arc<RwLock<HashMap<String, ModelChoice>>>,
    /// Chat API client.
    pub ollama: Arc<OllamaClient>,
    /// TTS service.
    pub tts_service: Arc<TtsService>,
    /// STT service.
    pub stt_service: Arc<SttService>,
    /// Model used by sessions that never picked one.
    pub default_model: String,
    /// Directory served as the fallback route.
    pub static_dir: String,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl AppState {
    /// Wires up the store and clients described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let sessions = SessionStore::new(config.conversation.clone());
        let ollama = OllamaClient::new(config.ollama.clone(), sessions.system_message());

        Self {
            sessions,
            model_choices: Arc::new(RwLock::new(HashMap::new())),
            ollama: Arc::new(ollama),
            tts_service: Arc::new(TtsService::from_config(&config.voice)),
            stt_service: Arc::new(SttService::from_config(&config.voice)),
            default_model: config.ollama.default_model.clone(),
            static_dir: config.server.static_dir.clone(),
            max_body_bytes: config.server.max_body_bytes,
        }
    }

    fn choices(&self) -> RwLockReadGuard<'_, HashMap<String, ModelChoice>> {
        self.model_choices.read().unwrap_or_else(|poisoned| {
            tracing::error!("model choice lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn choices_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, ModelChoice>> {
        self.model_choices.write().unwrap_or_else(|poisoned| {
            tracing::error!("model choice lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// The model a session chats with.
    pub fn current_model(&self, session_id: &str) -> String {
        self.choices()
            .get(session_id)
            .map(|choice| choice.model.clone())
            .unwrap_or_else(|| self.default_model.clone())
    }

    /// Records the model a session chats with from now on.
    pub fn set_model(&self, session_id: &str, model: impl Into<String>) {
        let choice = ModelChoice {
            model: model.into(),
            touched: Instant::now(),
        };
        self.choices_mut().insert(session_id.to_string(), choice);
    }

    /// Drops model choices of sessions the store no longer tracks, once they
    /// have gone unchanged for longer than `max_idle`. A client that picks a
    /// model before its first message keeps the choice until then.
    /// Returns how many were removed.
    pub fn forget_stale_model_choices(&self, max_idle: Duration) -> usize {
        let active = self.sessions.get_active_sessions();
        let mut choices = self.choices_mut();
        let before = choices.len();
        choices.retain(|id, choice| active.contains(id) || choice.touched.elapsed() <= max_idle);
        before - choices.len()
    }
}

/// Health check handler.
async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "ollama": state.ollama.is_connected().await,
        "whisper": state.stt_service.is_loaded(),
        "sessions": state.sessions.len(),
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/chat", post(api::chat_handler))
        .route("/process_audio", post(api::process_audio_handler))
        .route(
            "/api/conversation",
            get(api::get_conversation_handler).delete(api::clear_conversation_handler),
        )
        .route("/api/models", get(api_models::list_models_handler))
        .route("/api/change-model", post(api_models::change_model_handler))
        .route("/api/voices", get(api_voice::list_voices_handler))
        .route("/api/languages", get(api_voice::list_languages_handler));

    let static_dir = std::path::Path::new(&state.static_dir);
    let router = if static_dir.is_dir() {
        tracing::info!(path = %state.static_dir, "serving static files");
        router.fallback_service(ServeDir::new(static_dir))
    } else {
        tracing::info!(path = %state.static_dir, "static directory not found, skipping static file serving");
        router
    };

    router
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(axum::middleware::from_fn(middleware::session_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
