use habla_types::DEFAULT_VOICE;
use serde::{Deserialize, Serialize};

fn default_tts_binary() -> String {
    "edge-tts".to_string()
}

fn default_tts_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_tts_rate() -> f32 {
    1.0
}

fn default_stt_binary() -> String {
    "whisper-cli".to_string()
}

fn default_ffmpeg_binary() -> String {
    "ffmpeg".to_string()
}

fn default_stt_model() -> String {
    "models/ggml-base.bin".to_string()
}

fn default_stt_language() -> String {
    "es".to_string()
}

/// Settings for the external speech engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Path or name of the `edge-tts` executable.
    #[serde(default = "default_tts_binary")]
    pub tts_binary: String,
    /// Catalog voice used when a request names none.
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,
    /// Speaking rate multiplier (1.0 is normal). Must be within 0.5..=2.0.
    #[serde(default = "default_tts_rate")]
    pub tts_rate: f32,
    /// Path or name of the whisper.cpp CLI executable.
    #[serde(default = "default_stt_binary")]
    pub stt_binary: String,
    /// Converter turning browser recordings into WAV for whisper.cpp.
    /// Empty hands uploads to whisper as they are.
    #[serde(default = "default_ffmpeg_binary")]
    pub ffmpeg_binary: String,
    /// Path to the GGML Whisper model.
    #[serde(default = "default_stt_model")]
    pub stt_model: String,
    /// Language assumed when an upload does not name one.
    #[serde(default = "default_stt_language")]
    pub stt_language: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            tts_binary: default_tts_binary(),
            tts_voice: default_tts_voice(),
            tts_rate: default_tts_rate(),
            stt_binary: default_stt_binary(),
            ffmpeg_binary: default_ffmpeg_binary(),
            stt_model: default_stt_model(),
            stt_language: default_stt_language(),
        }
    }
}
