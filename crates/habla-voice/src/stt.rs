use crate::config::VoiceConfig;
use crate::error::VoiceError;
use crate::sanitizer;
use habla_types::is_supported_language;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Maximum audio input size for STT (10 MiB). Prevents OOM from oversized payloads.
const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for STT process execution.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for converting an upload to WAV.
const CONVERT_TIMEOUT: Duration = Duration::from_secs(60);

/// Transcribes recordings with the whisper.cpp command line tool.
#[derive(Debug, Clone)]
pub struct SttService {
    binary: PathBuf,
    model_path: PathBuf,
    default_language: String,
    /// ffmpeg-compatible converter run before whisper. `None` hands the
    /// upload to whisper untouched.
    converter: Option<PathBuf>,
}

impl SttService {
    pub fn new(
        binary: impl Into<PathBuf>,
        model_path: impl Into<PathBuf>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            model_path: model_path.into(),
            default_language: default_language.into(),
            converter: None,
        }
    }

    /// Builds the service from config. An empty `ffmpeg_binary` disables
    /// conversion.
    pub fn from_config(config: &VoiceConfig) -> Self {
        let service = Self::new(
            &config.stt_binary,
            &config.stt_model,
            config.stt_language.clone(),
        );
        match config.ffmpeg_binary.trim() {
            "" => service,
            converter => service.with_converter(converter),
        }
    }

    /// Converts uploads to 16 kHz mono WAV with `converter` before
    /// transcription. Browsers record WebM/Opus, which whisper.cpp cannot
    /// read.
    pub fn with_converter(mut self, converter: impl Into<PathBuf>) -> Self {
        self.converter = Some(converter.into());
        self
    }

    pub fn converter(&self) -> Option<&Path> {
        self.converter.as_deref()
    }

    /// Whether the configured model file is present on disk.
    pub fn is_loaded(&self) -> bool {
        self.model_path.is_file()
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Transcribes an uploaded recording.
    ///
    /// `language` defaults to the configured language when `None` or empty.
    /// Returns `Ok(None)` when the engine ran but heard nothing.
    pub async fn transcribe(
        &self,
        audio_data: &[u8],
        language: Option<&str>,
    ) -> Result<Option<String>, VoiceError> {
        if audio_data.is_empty() {
            return Err(VoiceError::Stt("audio data is empty".to_string()));
        }
        if audio_data.len() > MAX_STT_INPUT_BYTES {
            return Err(VoiceError::Stt(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                audio_data.len(),
                MAX_STT_INPUT_BYTES
            )));
        }

        let language = language
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .unwrap_or(self.default_language.as_str());
        if !is_supported_language(language) {
            return Err(VoiceError::UnsupportedLanguage(language.to_string()));
        }

        // whisper.cpp wants a seekable file, so the upload is spooled to a
        // temp file that is removed when `recording` drops.
        let recording = tempfile::Builder::new()
            .prefix("habla-stt-")
            .suffix(".webm")
            .tempfile()
            .map_err(|e| VoiceError::Stt(format!("Failed to create temp file: {}", e)))?;
        tokio::fs::write(recording.path(), audio_data)
            .await
            .map_err(|e| VoiceError::Stt(format!("Failed to write temp file: {}", e)))?;

        let wav = match &self.converter {
            Some(converter) => Some(convert_to_wav(converter, recording.path()).await?),
            None => None,
        };
        let input = wav.as_ref().map_or(recording.path(), |wav| wav.path());

        let mut command = Command::new(&self.binary);
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("-l")
            .arg(language)
            .arg("-nt") // no timestamps
            .arg("-np") // no progress or system info
            .arg("-f")
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(bytes = audio_data.len(), language, "transcribing recording");

        let child = command
            .spawn()
            .map_err(|e| VoiceError::Stt(format!("Failed to spawn STT binary: {}", e)))?;

        let output = tokio::time::timeout(STT_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Stt(format!(
                    "STT process timed out after {} seconds",
                    STT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Stt(format!("Failed to read stdout: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Stt(format!("STT binary failed: {}", stderr.trim())));
        }

        let stdout = match String::from_utf8(output.stdout) {
            Ok(stdout) => stdout,
            Err(e) => sanitizer::clean_bytes(e.as_bytes()),
        };
        let text = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if text.is_empty() {
            return Ok(None);
        }

        let preview: String = text.chars().take(50).collect();
        info!(language, preview = %preview, "transcribed recording");
        Ok(Some(text))
    }
}

/// Transcodes `input` to a 16 kHz mono PCM WAV temp file, removed when the
/// returned handle drops.
async fn convert_to_wav(
    converter: &Path,
    input: &Path,
) -> Result<tempfile::NamedTempFile, VoiceError> {
    let wav = tempfile::Builder::new()
        .prefix("habla-stt-")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| VoiceError::Stt(format!("Failed to create temp file: {}", e)))?;

    let mut command = Command::new(converter);
    command
        .arg("-nostdin")
        .arg("-y")
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input)
        .arg("-ar")
        .arg("16000")
        .arg("-ac")
        .arg("1")
        .arg("-c:a")
        .arg("pcm_s16le")
        .arg(wav.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command
        .spawn()
        .map_err(|e| VoiceError::Stt(format!("Failed to spawn audio converter: {}", e)))?;

    let output = tokio::time::timeout(CONVERT_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| {
            VoiceError::Stt(format!(
                "audio conversion timed out after {} seconds",
                CONVERT_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| VoiceError::Stt(format!("Failed to wait for audio converter: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VoiceError::Stt(format!(
            "audio conversion failed: {}",
            stderr.trim()
        )));
    }

    debug!(wav = %wav.path().display(), "converted recording to wav");
    Ok(wav)
}
