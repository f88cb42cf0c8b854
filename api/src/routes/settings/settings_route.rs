//! GET /api/settings: what the UI needs to draw its controls.

use std::sync::Arc;

use ai_llm_service::config::generation_params::SliderBounds;
use axum::extract::State;
use chat_core::Language;
use serde::Serialize;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub sliders: SliderBounds,
    pub languages: Vec<Language>,
    pub default_language: Language,
    /// Exchanges of history that reach the prompt.
    pub history_window: usize,
    pub provider: String,
    pub model: String,
}

pub async fn settings_route(State(state): State<Arc<AppState>>) -> ApiResponse<SettingsResponse> {
    let chat = state.bot.config();
    let llm = state.bot.generator().config();
    ApiResponse::success(SettingsResponse {
        sliders: state.sliders,
        languages: Language::ALL.to_vec(),
        default_language: chat.default_language,
        history_window: chat.history_window,
        provider: llm.provider.to_string(),
        model: llm.model.clone(),
    })
}
