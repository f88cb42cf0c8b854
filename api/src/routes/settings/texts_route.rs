//! GET /api/texts/{language}: localized labels for the UI.

use axum::extract::Path;
use chat_core::{Language, LocalizedTexts};
use serde::Serialize;

use crate::core::http::response_envelope::ApiResponse;

#[derive(Debug, Serialize)]
pub struct TextsResponse {
    pub language: Language,
    pub texts: &'static LocalizedTexts,
}

/// Unknown language names get the English labels.
pub async fn texts_route(Path(language): Path<String>) -> ApiResponse<TextsResponse> {
    let language = Language::parse(&language);
    ApiResponse::success(TextsResponse {
        language,
        texts: language.texts(),
    })
}
