//! Rewrites axum's plain-text body rejections into the JSON envelope.

use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Request fields the chat routes accept, in the order they are matched.
const KNOWN_FIELDS: [&str; 7] = [
    "history",
    "max_tokens",
    "temperature",
    "top_p",
    "language",
    "system",
    "message",
];

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn guess_path_from_serde_msg(msg: &str) -> Option<String> {
    KNOWN_FIELDS
        .iter()
        .find(|key| msg.contains(*key))
        .map(|key| key.to_string())
}

fn hint_for(msg: &str) -> Option<String> {
    if msg.contains("expected a sequence") {
        Some(r#"Expected an array of exchanges (e.g. [{"user": "Habari?", "bot": "Nzuri"}])."#.into())
    } else if msg.contains("expected f32") || msg.contains("expected u32") {
        Some("Expected a number for this field.".into())
    } else if msg.contains("missing field `message`") {
        Some(r#"Send the chat text as {"message": "..."}."#.into())
    } else if msg.contains("expected a map") || msg.contains("expected struct") {
        Some(r#"Expected a JSON object here (e.g. { "field": "value" })."#.into())
    } else {
        None
    }
}

fn ensure_request_id(parts: &mut axum::http::response::Parts) -> String {
    if let Some(v) = parts
        .headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        return v.to_string();
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    let id = format!("req-{nanos}");
    if let Ok(value) = HeaderValue::from_str(&id) {
        parts.headers.insert("X-Request-Id", value);
    }
    id
}

pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    // Only 400/422 with a non-JSON body come from extractor rejections.
    let is_json = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json
        || !(status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY)
    {
        return res;
    }

    let (mut parts, bytes) = take_body(res).await;
    let original = String::from_utf8_lossy(&bytes);
    let request_id = ensure_request_id(&mut parts);
    debug!(request_id = %request_id, %status, body = %original.trim(), "request rejected");

    let detail = ApiErrorDetail {
        path: guess_path_from_serde_msg(&original),
        hint: hint_for(&original),
    };

    let envelope = ApiResponse::<()>::error(
        if status == StatusCode::BAD_REQUEST {
            "BAD_REQUEST"
        } else {
            "UNPROCESSABLE_ENTITY"
        },
        original.trim(),
        vec![detail],
    );

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_field_and_hint() {
        let msg = "Failed to deserialize the JSON body into the target type: history: \
                   invalid type: string \"hi\", expected a sequence at line 1 column 20";
        assert_eq!(guess_path_from_serde_msg(msg).as_deref(), Some("history"));
        assert!(hint_for(msg).unwrap().starts_with("Expected an array"));

        let msg = "missing field `message` at line 1 column 2";
        assert_eq!(guess_path_from_serde_msg(msg).as_deref(), Some("message"));
        assert!(hint_for(msg).unwrap().contains("\"message\""));

        assert_eq!(guess_path_from_serde_msg("syntax error"), None);
    }

    #[test]
    fn keeps_existing_request_id() {
        let (mut parts, _) = axum::http::Response::builder()
            .header("X-Request-Id", "abc")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(ensure_request_id(&mut parts), "abc");

        let (mut parts, _) = axum::http::Response::new(()).into_parts();
        let id = ensure_request_id(&mut parts);
        assert!(id.starts_with("req-"));
        assert_eq!(parts.headers["X-Request-Id"], id.as_str());
    }
}
