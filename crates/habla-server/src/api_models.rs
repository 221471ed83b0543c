//! Model listing and per-session model selection.

use crate::api::ApiError;
use crate::middleware::SessionContext;
use crate::ollama::ModelInfo;
use crate::AppState;
use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Response body for `GET /api/models`.
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub current: String,
    /// Set when the model list could not be fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Request body for `POST /api/change-model`.
#[derive(Debug, Deserialize)]
pub struct ChangeModelRequest {
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChangeModelResponse {
    pub success: bool,
    pub model: String,
}

/// Handler for `GET /api/models`.
///
/// A session whose model is no longer installed is moved to the first
/// installed one. An unreachable API still answers 200, with no models.
pub async fn list_models_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(SessionContext(session_id)): Extension<SessionContext>,
) -> Json<ModelsResponse> {
    let models = match state.ollama.list_models().await {
        Ok(models) => models,
        Err(e) => {
            tracing::warn!(error = %e, "failed to list ollama models");
            return Json(ModelsResponse {
                models: Vec::new(),
                current: state.default_model.clone(),
                error: Some(e.to_string()),
            });
        }
    };

    let mut current = state.current_model(&session_id);
    if let Some(first) = models.first() {
        if !models.iter().any(|m| m.name == current) {
            tracing::info!(
                session_id = %session_id,
                missing = %current,
                fallback = %first.name,
                "selected model not installed, falling back"
            );
            current = first.name.clone();
            state.set_model(&session_id, current.as_str());
        }
    }

    Json(ModelsResponse {
        models,
        current,
        error: None,
    })
}

/// Handler for `POST /api/change-model`.
pub async fn change_model_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(SessionContext(session_id)): Extension<SessionContext>,
    Json(payload): Json<ChangeModelRequest>,
) -> Result<Json<ChangeModelResponse>, ApiError> {
    let model = payload
        .model
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No model specified".to_string()))?;

    let models = state.ollama.list_models().await?;
    if !models.iter().any(|m| m.name == model) {
        return Err(ApiError::NotFound(format!("Model not found: {}", model)));
    }

    state.set_model(&session_id, model.as_str());
    tracing::info!(session_id = %session_id, model = %model, "changed session model");

    Ok(Json(ChangeModelResponse {
        success: true,
        model,
    }))
}
