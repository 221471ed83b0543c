//! API handlers for conversation turns.

use crate::middleware::SessionContext;
use crate::ollama::OllamaError;
use crate::AppState;
use axum::{
    extract::{Extension, Json, Multipart},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use habla_types::Message;
use habla_voice::VoiceError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Request body for `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Catalog voice for the spoken reply; the configured voice if absent.
    #[serde(default)]
    pub voice: Option<String>,
}

/// Response body for `POST /chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// Base64 MP3 of the reply, `null` when synthesis failed.
    pub audio: Option<String>,
}

/// Response body for `POST /process_audio`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioTurnResponse {
    pub user_text: String,
    pub bot_text: String,
    pub audio_response: Option<String>,
}

/// Response body for `GET /api/conversation`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub session_id: String,
    pub messages: Vec<Message>,
    /// Messages after the system directive.
    pub count: usize,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream error: {0}")]
    BadGateway(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<OllamaError> for ApiError {
    fn from(e: OllamaError) -> Self {
        ApiError::BadGateway(format!("Error getting response from Ollama: {}", e))
    }
}

impl From<VoiceError> for ApiError {
    fn from(e: VoiceError) -> Self {
        match e {
            VoiceError::UnsupportedLanguage(_) | VoiceError::VoiceNotFound(_) => {
                ApiError::BadRequest(e.to_string())
            }
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

/// Runs one conversation turn and returns the model's reply.
///
/// The user message is recorded before the chat API is called and stays in
/// the history if the call fails.
pub async fn run_turn(
    state: &AppState,
    session_id: &str,
    user_text: &str,
) -> Result<String, ApiError> {
    state.sessions.push(session_id, Message::user(user_text));
    let messages = state.sessions.get_conversation(session_id);
    let model = state.current_model(session_id);

    let reply = state
        .ollama
        .chat(&messages, &model)
        .await
        .inspect_err(|e| {
            tracing::error!(session_id, model = %model, error = %e, "chat request failed");
        })?;

    state.sessions.push(session_id, Message::assistant(reply.as_str()));
    Ok(reply)
}

/// Handler for `POST /chat`.
pub async fn chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(SessionContext(session_id)): Extension<SessionContext>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("No message provided".to_string()));
    }

    let response = run_turn(&state, &session_id, message).await?;
    let audio = state
        .tts_service
        .generate_audio(&response, payload.voice.as_deref())
        .await;

    Ok(Json(ChatResponse { response, audio }))
}

/// Handler for `POST /process_audio`.
///
/// Expects a multipart form with an `audio` file and optional `language`
/// and `voice` text fields.
pub async fn process_audio_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(SessionContext(session_id)): Extension<SessionContext>,
    mut multipart: Multipart,
) -> Result<Json<AudioTurnResponse>, ApiError> {
    let mut audio = None;
    let mut language = None;
    let mut voice = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read audio: {}", e)))?;
                audio = Some(bytes);
            }
            "language" | "voice" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read {}: {}", name, e)))?;
                if name == "language" {
                    language = Some(value);
                } else {
                    voice = Some(value);
                }
            }
            _ => {}
        }
    }

    let audio = audio
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No audio file".to_string()))?;

    let user_text = state
        .stt_service
        .transcribe(&audio, language.as_deref())
        .await
        .inspect_err(|e| {
            tracing::error!(session_id = %session_id, error = %e, "transcription failed");
        })?
        .ok_or_else(|| ApiError::BadRequest("No se detectó texto".to_string()))?;

    let bot_text = run_turn(&state, &session_id, &user_text).await?;
    let audio_response = state
        .tts_service
        .generate_audio(&bot_text, voice.as_deref())
        .await;

    Ok(Json(AudioTurnResponse {
        user_text,
        bot_text,
        audio_response,
    }))
}

/// Handler for `GET /api/conversation`.
pub async fn get_conversation_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(SessionContext(session_id)): Extension<SessionContext>,
) -> Json<ConversationResponse> {
    let messages = state.sessions.get_conversation(&session_id);
    let count = messages.len().saturating_sub(1);

    Json(ConversationResponse {
        session_id,
        messages,
        count,
    })
}

/// Handler for `DELETE /api/conversation`.
pub async fn clear_conversation_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(SessionContext(session_id)): Extension<SessionContext>,
) -> StatusCode {
    state.sessions.clear_conversation(&session_id);
    StatusCode::NO_CONTENT
}
