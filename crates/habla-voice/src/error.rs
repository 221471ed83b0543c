use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("STT error: {0}")]
    Stt(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}
