//! Server configuration loading from file and environment variables.

use habla_session::SessionConfig;
use habla_voice::VoiceConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Chat model API settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Conversation history settings.
    #[serde(default)]
    pub conversation: SessionConfig,

    /// Speech engine settings.
    #[serde(default)]
    pub voice: VoiceConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body, audio uploads included.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Directory of browser assets served as the fallback route.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "habla_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Connection and generation settings for the Ollama chat API.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_host")]
    pub host: String,

    #[serde(default = "default_ollama_port")]
    pub port: u16,

    /// Model used until a session picks another one.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Timeout for a chat completion, in seconds.
    #[serde(default = "default_ollama_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_seed")]
    pub seed: i64,

    /// Upper bound on generated tokens per reply.
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,

    /// Sequences that end generation, so the model does not write the
    /// user's next turn itself.
    #[serde(default = "default_stop")]
    pub stop: Vec<String>,
}

impl OllamaConfig {
    /// Base URL of the Ollama API.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    7860
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ollama_host() -> String {
    "ollama".to_string()
}

fn default_ollama_port() -> u16 {
    11434
}

fn default_model() -> String {
    "llama2:7b".to_string()
}

fn default_ollama_timeout() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.7
}

fn default_seed() -> i64 {
    42
}

fn default_num_predict() -> u32 {
    512
}

fn default_stop() -> Vec<String> {
    ["User:", "Usuario:", "Human:", "Humano:"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            port: default_ollama_port(),
            default_model: default_model(),
            timeout_seconds: default_ollama_timeout(),
            temperature: default_temperature(),
            seed: default_seed(),
            num_predict: default_num_predict(),
            stop: default_stop(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `HABLA_HOST`, `HABLA_PORT` override `server.host` / `server.port`
/// - `HABLA_MAX_BODY_BYTES` overrides `server.max_body_bytes`
/// - `HABLA_STATIC_DIR` overrides `server.static_dir`
/// - `HABLA_LOG_LEVEL` overrides `logging.level`
/// - `HABLA_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `OLLAMA_HOST`, `OLLAMA_PORT`, `OLLAMA_MODEL`, `OLLAMA_TIMEOUT` override
///   the `ollama` section
/// - `MAX_CONVERSATION_LENGTH` overrides `conversation.max_length`
/// - `HABLA_SESSION_IDLE_TTL` overrides `conversation.idle_ttl_seconds`
/// - `TTS_BINARY`, `TTS_VOICE`, `TTS_RATE`, `WHISPER_BINARY`,
///   `FFMPEG_BINARY`, `WHISPER_MODEL`, `WHISPER_LANGUAGE` override the
///   `voice` section
///
/// Unparseable numeric overrides are ignored.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Applies environment overrides using `lookup` to read variables.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    fn parsed<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
        value.and_then(|v| v.trim().parse().ok())
    }

    if let Some(host) = parsed(lookup("HABLA_HOST")) {
        config.server.host = host;
    }
    if let Some(port) = parsed(lookup("HABLA_PORT")) {
        config.server.port = port;
    }
    if let Some(bytes) = parsed(lookup("HABLA_MAX_BODY_BYTES")) {
        config.server.max_body_bytes = bytes;
    }
    if let Some(dir) = lookup("HABLA_STATIC_DIR") {
        config.server.static_dir = dir;
    }
    if let Some(level) = lookup("HABLA_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("HABLA_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    if let Some(host) = lookup("OLLAMA_HOST") {
        config.ollama.host = host;
    }
    if let Some(port) = parsed(lookup("OLLAMA_PORT")) {
        config.ollama.port = port;
    }
    if let Some(model) = lookup("OLLAMA_MODEL") {
        config.ollama.default_model = model;
    }
    if let Some(timeout) = parsed(lookup("OLLAMA_TIMEOUT")) {
        config.ollama.timeout_seconds = timeout;
    }

    if let Some(max_length) = parsed(lookup("MAX_CONVERSATION_LENGTH")) {
        config.conversation.max_length = max_length;
    }
    if let Some(ttl) = parsed(lookup("HABLA_SESSION_IDLE_TTL")) {
        config.conversation.idle_ttl_seconds = Some(ttl);
    }

    if let Some(binary) = lookup("TTS_BINARY") {
        config.voice.tts_binary = binary;
    }
    if let Some(voice) = lookup("TTS_VOICE") {
        config.voice.tts_voice = voice;
    }
    if let Some(rate) = parsed(lookup("TTS_RATE")) {
        config.voice.tts_rate = rate;
    }
    if let Some(binary) = lookup("WHISPER_BINARY") {
        config.voice.stt_binary = binary;
    }
    if let Some(ffmpeg) = lookup("FFMPEG_BINARY") {
        config.voice.ffmpeg_binary = ffmpeg;
    }
    if let Some(model) = lookup("WHISPER_MODEL") {
        config.voice.stt_model = model;
    }
    if let Some(language) = lookup("WHISPER_LANGUAGE") {
        config.voice.stt_language = language;
    }
}
