use axum::http::HeaderMap;

pub mod chat;
pub mod health;
pub mod sessions;
pub mod settings;
pub mod ui;

/// `X-Request-Id` sent by the caller, or `-`.
pub(crate) fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
}
