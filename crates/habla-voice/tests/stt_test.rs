use habla_voice::{SttService, VoiceConfig, VoiceError};

#[tokio::test]
async fn test_stt_rejects_empty_audio() {
    let service = SttService::new("whisper-cli", "model.bin", "es");

    let result = service.transcribe(&[], None).await;
    assert!(matches!(result, Err(VoiceError::Stt(_))));
}

#[tokio::test]
async fn test_stt_rejects_oversized_audio() {
    let service = SttService::new("whisper-cli", "model.bin", "es");
    let audio = vec![0u8; 10 * 1024 * 1024 + 1];

    let result = service.transcribe(&audio, None).await;
    match result {
        Err(VoiceError::Stt(msg)) => assert!(msg.contains("exceeds maximum size"), "got: {}", msg),
        _ => panic!("Expected size error, got {:?}", result),
    }
}

#[tokio::test]
async fn test_stt_rejects_unsupported_language() {
    let service = SttService::new("whisper-cli", "model.bin", "es");

    let result = service.transcribe(b"fake audio", Some("tlh")).await;
    match result {
        Err(VoiceError::UnsupportedLanguage(lang)) => assert_eq!(lang, "tlh"),
        _ => panic!("Expected UnsupportedLanguage, got {:?}", result),
    }
}

#[tokio::test]
async fn test_stt_missing_binary() {
    let service = SttService::new("/nonexistent/habla/whisper-cli", "model.bin", "es");

    let result = service.transcribe(b"fake audio", None).await;
    match result {
        Err(VoiceError::Stt(msg)) => assert!(msg.contains("Failed to spawn"), "got: {}", msg),
        _ => panic!("Expected spawn failure, got {:?}", result),
    }
}

#[tokio::test]
async fn test_stt_is_loaded_checks_model_file() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("ggml-base.bin");

    let service = SttService::new("whisper-cli", &model, "es");
    assert!(!service.is_loaded());

    std::fs::write(&model, b"weights").unwrap();
    assert!(service.is_loaded());
}

#[tokio::test]
async fn test_stt_from_config_defaults() {
    let service = SttService::from_config(&VoiceConfig::default());

    assert_eq!(service.model_path().to_str(), Some("models/ggml-base.bin"));
    assert_eq!(service.converter().and_then(|c| c.to_str()), Some("ffmpeg"));
}

#[test]
fn test_stt_empty_converter_disables_conversion() {
    let config = VoiceConfig {
        ffmpeg_binary: "  ".to_string(),
        ..VoiceConfig::default()
    };

    assert!(SttService::from_config(&config).converter().is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn test_stt_passes_model_language_and_file() {
    // echo stands in for whisper-cli and prints the arguments it got.
    let service = SttService::new("echo", "ggml-small.bin", "es");

    let text = service
        .transcribe(b"fake audio", Some("fr"))
        .await
        .unwrap()
        .unwrap();

    assert!(text.starts_with("-m ggml-small.bin -l fr -nt -np -f "), "got: {}", text);
    assert!(text.ends_with(".webm"), "got: {}", text);
}

#[cfg(unix)]
#[tokio::test]
async fn test_stt_transcribes_converted_wav() {
    // `true` stands in for ffmpeg; whisper (echo) must be handed the WAV
    // output, not the raw upload.
    let service = SttService::new("echo", "ggml-small.bin", "es").with_converter("true");

    let text = service
        .transcribe(b"fake webm", None)
        .await
        .unwrap()
        .unwrap();

    assert!(text.starts_with("-m ggml-small.bin -l es -nt -np -f "), "got: {}", text);
    assert!(text.ends_with(".wav"), "got: {}", text);
}

#[cfg(unix)]
#[tokio::test]
async fn test_stt_failing_converter() {
    let service = SttService::new("echo", "model.bin", "es").with_converter("false");

    let result = service.transcribe(b"fake webm", None).await;
    match result {
        Err(VoiceError::Stt(msg)) => assert!(msg.contains("audio conversion failed"), "got: {}", msg),
        _ => panic!("Expected conversion failure, got {:?}", result),
    }
}

#[tokio::test]
async fn test_stt_missing_converter() {
    let service = SttService::new("echo", "model.bin", "es")
        .with_converter("/nonexistent/habla/ffmpeg");

    let result = service.transcribe(b"fake webm", None).await;
    match result {
        Err(VoiceError::Stt(msg)) => {
            assert!(msg.contains("Failed to spawn audio converter"), "got: {}", msg)
        }
        _ => panic!("Expected converter spawn failure, got {:?}", result),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_stt_silence_is_none() {
    // `true` exits successfully without printing anything.
    let service = SttService::new("true", "model.bin", "es");

    let result = service.transcribe(b"fake audio", None).await.unwrap();
    assert_eq!(result, None);
}

#[test]
fn test_voice_config_from_toml() {
    let config: VoiceConfig = toml::from_str(
        r#"
        tts_voice = "es-ES-ElviraNeural"
        stt_language = "en"
        "#,
    )
    .unwrap();

    assert_eq!(config.tts_voice, "es-ES-ElviraNeural");
    assert_eq!(config.stt_language, "en");
    assert_eq!(config.ffmpeg_binary, "ffmpeg");
    assert_eq!(config.tts_binary, "edge-tts");
    assert_eq!(config.tts_rate, 1.0);
}
