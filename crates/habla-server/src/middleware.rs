use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use rand::RngCore;

/// Name of the cookie carrying the conversation id.
pub const SESSION_COOKIE: &str = "habla_session";

/// Length of a session id in hex characters.
const SESSION_ID_HEX_LEN: usize = 32;

/// The caller's conversation id, stored in request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionContext(pub String);

/// Generates a fresh 128-bit session id as lowercase hex.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_HEX_LEN / 2];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn is_valid_session_id(id: &str) -> bool {
    id.len() == SESSION_ID_HEX_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Extracts a well-formed session id from the `Cookie` headers.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, id)| id.trim().to_ascii_lowercase())
        .filter(|id| is_valid_session_id(id))
}

/// Attaches a [`SessionContext`] to every request.
///
/// Requests without a usable `habla_session` cookie get a new id, which is
/// returned to the browser in a `Set-Cookie` header on the response.
pub async fn session_middleware(mut req: Request<Body>, next: Next) -> Response {
    let (session_id, issued) = match session_id_from_headers(req.headers()) {
        Some(id) => (id, false),
        None => (generate_session_id(), true),
    };

    req.extensions_mut()
        .insert(SessionContext(session_id.clone()));

    let mut response = next.run(req).await;

    if issued {
        let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
                tracing::debug!(session_id = %session_id, "issued session cookie");
            }
            Err(e) => tracing::error!(error = %e, "failed to encode session cookie"),
        }
    }

    response
}
