use serde::{Deserialize, Serialize};

/// History bound used when the configuration does not set one. Counts the
/// system directive.
pub const DEFAULT_MAX_CONVERSATION_LENGTH: usize = 20;

/// Directive seeded at position 0 of every conversation.
pub const DEFAULT_SYSTEM_MESSAGE: &str = "Eres un asistente de voz amigable que SIEMPRE responde en español.
REGLAS IMPORTANTES:
- SIEMPRE responde en español, sin importar en qué idioma te hablen
- NO uses emojis, emoticones ni caracteres especiales
- NO uses asteriscos (*), guiones bajos (_) o símbolos de formato
- NO agregues notas como \"(en español)\" o traducciones
- Habla de forma natural y conversacional
- Si recibes texto en otro idioma, responde en español
- Mantén tus respuestas claras y directas

RECUERDA: Tu idioma de respuesta es SIEMPRE español.";

fn default_max_length() -> usize {
    DEFAULT_MAX_CONVERSATION_LENGTH
}

fn default_system_message() -> String {
    DEFAULT_SYSTEM_MESSAGE.to_string()
}

/// Configuration injected into a [`SessionStore`](crate::SessionStore) at
/// construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum messages kept per session, system directive included.
    /// Values below 1 are treated as 1.
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Text of the system directive at history position 0.
    #[serde(default = "default_system_message")]
    pub system_message: String,

    /// Sessions untouched for this many seconds are dropped by the idle
    /// reaper. `None` keeps sessions for the life of the process.
    #[serde(default)]
    pub idle_ttl_seconds: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            system_message: default_system_message(),
            idle_ttl_seconds: None,
        }
    }
}

impl SessionConfig {
    pub fn new(max_length: usize, system_message: impl Into<String>) -> Self {
        Self {
            max_length,
            system_message: system_message.into(),
            idle_ttl_seconds: None,
        }
    }
}
