use crate::config::VoiceConfig;
use crate::error::VoiceError;
use crate::sanitizer;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use habla_types::{find_voice, VoiceOption};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, warn};

/// Maximum text input size for TTS (64 KiB). Prevents resource exhaustion from
/// oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for TTS process execution.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// Service rendering text to speech with the `edge-tts` command line tool.
///
/// Text is always run through [`sanitizer::clean`] before synthesis, so
/// callers can hand over raw model output.
#[derive(Debug, Clone)]
pub struct TtsService {
    binary: PathBuf,
    default_voice: String,
    rate: f32,
}

impl TtsService {
    /// Creates a service invoking `binary`, speaking with `default_voice`
    /// unless a request names another catalog voice.
    pub fn new(binary: impl AsRef<Path>, default_voice: impl Into<String>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            default_voice: default_voice.into(),
            rate: 1.0,
        }
    }

    pub fn from_config(config: &VoiceConfig) -> Self {
        Self::new(&config.tts_binary, config.tts_voice.clone()).with_rate(config.tts_rate)
    }

    /// Sets the speaking rate multiplier. Validated at synthesis time.
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn default_voice(&self) -> &str {
        &self.default_voice
    }

    /// Resolves a requested voice code against the catalog. A missing, empty
    /// or unknown code falls back to the default voice; only a default that
    /// is not in the catalog is an error.
    pub fn resolve_voice(&self, requested: Option<&str>) -> Result<&'static VoiceOption, VoiceError> {
        let requested = requested.map(str::trim).filter(|code| !code.is_empty());
        if let Some(code) = requested {
            match find_voice(code) {
                Some(voice) => return Ok(voice),
                None => warn!(
                    voice = code,
                    default = %self.default_voice,
                    "unknown voice requested, using the default"
                ),
            }
        }
        find_voice(&self.default_voice)
            .ok_or_else(|| VoiceError::VoiceNotFound(self.default_voice.clone()))
    }

    /// Synthesizes speech for `text`, returning the MP3 bytes written by
    /// `edge-tts`.
    pub async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Vec<u8>, VoiceError> {
        let voice = self.resolve_voice(voice)?;

        if !(0.5..=2.0).contains(&self.rate) {
            return Err(VoiceError::Config(
                "Rate must be between 0.5 and 2.0".to_string(),
            ));
        }

        let text = sanitizer::clean(text);
        if text.is_empty() {
            return Err(VoiceError::Tts(
                "no speakable text left after cleaning".to_string(),
            ));
        }
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Tts(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        // edge-tts takes the rate as a signed percentage offset.
        let rate_percent = ((self.rate - 1.0) * 100.0).round() as i32;

        let mut command = Command::new(&self.binary);
        command
            .arg("--voice")
            .arg(voice.code)
            .arg("--text")
            .arg(&text)
            .arg(format!("--rate={:+}%", rate_percent))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(voice = voice.code, chars = text.chars().count(), "synthesizing speech");

        let child = command
            .spawn()
            .map_err(|e| VoiceError::Tts(format!("Failed to spawn edge-tts: {}", e)))?;

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Tts(format!(
                    "TTS process timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Tts(format!("Failed to wait for edge-tts: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Tts(format!("edge-tts failed: {}", stderr.trim())));
        }

        if output.stdout.is_empty() {
            return Err(VoiceError::Tts("edge-tts produced no audio".to_string()));
        }

        Ok(output.stdout)
    }

    /// Synthesizes speech and returns it base64-encoded for JSON transport.
    ///
    /// Returns `None` on any failure; the reason is logged. A chat reply is
    /// still worth delivering without its audio.
    pub async fn generate_audio(&self, text: &str, voice: Option<&str>) -> Option<String> {
        match self.synthesize(text, voice).await {
            Ok(audio) => Some(BASE64.encode(audio)),
            Err(e) => {
                error!(error = %e, "speech synthesis failed");
                None
            }
        }
    }
}
