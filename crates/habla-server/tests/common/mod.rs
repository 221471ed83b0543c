#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use habla_server::config::Config;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const FAKE_REPLY: &str = "¡Hola! 😊 *sonríe* ¿En qué puedo ayudarte?";

/// Chat request bodies received by the fake API, in arrival order.
pub type Recorded = Arc<Mutex<Vec<Value>>>;

#[derive(Clone)]
struct FakeOllama {
    recorded: Recorded,
    chat_status: StatusCode,
}

async fn tags() -> Json<Value> {
    Json(json!({
        "models": [
            { "name": "llama2:7b", "size": 3825819519u64, "modified_at": "2024-01-10T12:00:00Z" },
            { "name": "mistral:latest", "size": 4109865159u64, "modified_at": "2024-02-01T08:30:00Z" }
        ]
    }))
}

async fn chat(State(fake): State<FakeOllama>, Json(body): Json<Value>) -> Response {
    fake.recorded.lock().unwrap().push(body);
    if fake.chat_status != StatusCode::OK {
        return (fake.chat_status, "model exploded").into_response();
    }
    Json(json!({
        "model": "llama2:7b",
        "message": { "role": "assistant", "content": FAKE_REPLY },
        "done": true
    }))
    .into_response()
}

/// Starts a stand-in Ollama on an ephemeral port. Chat calls answer with
/// `chat_status`, and with [`FAKE_REPLY`] when that is 200.
pub async fn spawn_fake_ollama(chat_status: StatusCode) -> (u16, Recorded) {
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/api/tags", get(tags))
        .route("/api/chat", post(chat))
        .with_state(FakeOllama {
            recorded: recorded.clone(),
            chat_status,
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (port, recorded)
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Config pointing at a local Ollama on `port`, with speech binaries that
/// do not exist so synthesis always fails softly.
pub fn test_config(port: u16) -> Config {
    let mut config = Config::default();
    config.ollama.host = "127.0.0.1".to_string();
    config.ollama.port = port;
    config.ollama.timeout_seconds = 5;
    config.voice.tts_binary = "/nonexistent/edge-tts".to_string();
    config.voice.stt_binary = "/nonexistent/whisper-cli".to_string();
    // `true` stands in for ffmpeg and leaves an empty WAV behind.
    config.voice.ffmpeg_binary = "true".to_string();
    config.server.static_dir = "/nonexistent/static".to_string();
    config
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// `name=value` pair of the session cookie set by `response`, if any.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
