//! Voice and language catalogs.
//!
//! The synthesizer only speaks Spanish voices from a fixed list, and the
//! transcriber accepts a fixed list of input languages. Both catalogs are
//! static so handlers can filter them without locking or allocation.

use serde::Serialize;

/// Voice used when a request does not name one.
pub const DEFAULT_VOICE: &str = "es-MX-DaliaNeural";

/// Perceived gender of a synthesis voice, as labelled in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VoiceGender {
    #[serde(rename = "Femenino")]
    Female,
    #[serde(rename = "Masculino")]
    Male,
}

impl VoiceGender {
    pub fn label(self) -> &'static str {
        match self {
            Self::Female => "Femenino",
            Self::Male => "Masculino",
        }
    }

    /// Matches either the Spanish catalog label or the English word,
    /// ignoring case.
    pub fn matches(self, query: &str) -> bool {
        let query = query.trim();
        let english = match self {
            Self::Female => "female",
            Self::Male => "male",
        };
        query.eq_ignore_ascii_case(self.label()) || query.eq_ignore_ascii_case(english)
    }
}

/// A synthesis voice offered to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoiceOption {
    /// Engine voice identifier, e.g. `es-MX-DaliaNeural`.
    pub code: &'static str,
    /// Display name shown in the voice picker.
    pub name: &'static str,
    pub gender: VoiceGender,
}

impl VoiceOption {
    /// Region part of the voice code (`MX` for `es-MX-DaliaNeural`).
    pub fn country(&self) -> &'static str {
        self.code.split('-').nth(1).unwrap_or_default()
    }
}

/// The Spanish voices the synthesizer is allowed to use.
pub const VOICES: &[VoiceOption] = &[
    VoiceOption {
        code: "es-MX-DaliaNeural",
        name: "Dalia (México)",
        gender: VoiceGender::Female,
    },
    VoiceOption {
        code: "es-MX-JorgeNeural",
        name: "Jorge (México)",
        gender: VoiceGender::Male,
    },
    VoiceOption {
        code: "es-ES-AlvaroNeural",
        name: "Álvaro (España)",
        gender: VoiceGender::Male,
    },
    VoiceOption {
        code: "es-ES-ElviraNeural",
        name: "Elvira (España)",
        gender: VoiceGender::Female,
    },
    VoiceOption {
        code: "es-AR-TomasNeural",
        name: "Tomás (Argentina)",
        gender: VoiceGender::Male,
    },
    VoiceOption {
        code: "es-AR-ElenaNeural",
        name: "Elena (Argentina)",
        gender: VoiceGender::Female,
    },
    VoiceOption {
        code: "es-CO-GonzaloNeural",
        name: "Gonzalo (Colombia)",
        gender: VoiceGender::Male,
    },
    VoiceOption {
        code: "es-CO-SalomeNeural",
        name: "Salomé (Colombia)",
        gender: VoiceGender::Female,
    },
];

/// Looks up a catalog voice by its exact code.
pub fn find_voice(code: &str) -> Option<&'static VoiceOption> {
    VOICES.iter().find(|v| v.code == code)
}

/// Voices whose region matches `country` (case-insensitive, e.g. `mx`).
pub fn voices_by_country(country: &str) -> Vec<&'static VoiceOption> {
    VOICES
        .iter()
        .filter(|v| v.country().eq_ignore_ascii_case(country.trim()))
        .collect()
}

/// Voices of the given gender; accepts `Femenino`/`Masculino` or
/// `female`/`male`.
pub fn voices_by_gender(gender: &str) -> Vec<&'static VoiceOption> {
    VOICES.iter().filter(|v| v.gender.matches(gender)).collect()
}

/// A language the transcriber can be asked to listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageOption {
    /// ISO 639-1 code passed to the transcriber.
    pub code: &'static str,
    /// Endonym shown in the language picker.
    pub name: &'static str,
}

pub const LANGUAGES: &[LanguageOption] = &[
    LanguageOption { code: "es", name: "Español" },
    LanguageOption { code: "en", name: "English" },
    LanguageOption { code: "fr", name: "Français" },
    LanguageOption { code: "de", name: "Deutsch" },
    LanguageOption { code: "it", name: "Italiano" },
    LanguageOption { code: "pt", name: "Português" },
    LanguageOption { code: "ru", name: "Русский" },
    LanguageOption { code: "ja", name: "日本語" },
    LanguageOption { code: "ko", name: "한국어" },
    LanguageOption { code: "zh", name: "中文" },
];

/// Returns `true` if `code` is one of the supported transcription languages.
pub fn is_supported_language(code: &str) -> bool {
    LANGUAGES.iter().any(|l| l.code == code)
}
