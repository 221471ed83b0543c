//! Speech plumbing for the Habla voice-chat server.
//!
//! Three pieces live here:
//!
//! - [`sanitizer`]: the pure text-cleaning pipeline every reply passes
//!   through before it reaches the synthesizer.
//! - [`TtsService`]: renders sanitized text to MP3 with the `edge-tts` CLI.
//! - [`SttService`]: transcribes uploaded recordings with the whisper.cpp CLI.
//!
//! Both external engines run as child processes with bounded input sizes and
//! timeouts, so a stuck engine can delay a request but never wedge the
//! server.

pub mod config;
pub mod error;
pub mod sanitizer;
pub mod stt;
pub mod tts;

pub use config::VoiceConfig;
pub use error::VoiceError;
pub use sanitizer::{clean, clean_bytes};
pub use stt::SttService;
pub use tts::TtsService;
