use crate::AppState;
use axum::extract::{Extension, Json, Query};
use habla_types::{
    voices_by_country, voices_by_gender, LanguageOption, VoiceOption, LANGUAGES, VOICES,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct VoiceFilter {
    /// Region code such as `MX` or `es`.
    pub country: Option<String>,
    /// `Femenino`/`Masculino` or `female`/`male`.
    pub gender: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<&'static VoiceOption>,
    pub default: String,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: &'static [LanguageOption],
}

/// Handler for `GET /api/voices`. Filters combine.
pub async fn list_voices_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(filter): Query<VoiceFilter>,
) -> Json<VoicesResponse> {
    let country = filter.country.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let gender = filter.gender.as_deref().map(str::trim).filter(|g| !g.is_empty());

    let voices: Vec<&'static VoiceOption> = match (country, gender) {
        (Some(c), Some(g)) => voices_by_country(c)
            .into_iter()
            .filter(|v| v.gender.matches(g))
            .collect(),
        (Some(c), None) => voices_by_country(c),
        (None, Some(g)) => voices_by_gender(g),
        (None, None) => VOICES.iter().collect(),
    };

    Json(VoicesResponse {
        voices,
        default: state.tts_service.default_voice().to_string(),
    })
}

/// Handler for `GET /api/languages`.
pub async fn list_languages_handler() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: LANGUAGES,
    })
}
