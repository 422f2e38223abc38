//! Settings handlers.
//!
//! - `GET    /settings` – current settings
//! - `PATCH  /settings` – partial update, persisted
//! - `DELETE /settings` – back to defaults

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get,
};
use wpay_core::storage::StorageError;
use wpay_sdk::objects::SettingsPatch;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/settings",
        get(get_settings).patch(update_settings).delete(reset_settings),
    )
}

async fn get_settings(state: State<AppState>) -> impl IntoResponse {
    Json(state.orchestrator.settings().current().await)
}

async fn update_settings(
    state: State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<impl IntoResponse, SettingsApiError> {
    let settings = state.orchestrator.settings().update(patch).await?;
    tracing::info!(
        asset = %settings.default_payment_asset,
        testnet = settings.enable_testnet,
        "Settings updated"
    );
    Ok(Json(settings))
}

async fn reset_settings(state: State<AppState>) -> Result<impl IntoResponse, SettingsApiError> {
    let settings = state.orchestrator.settings().reset().await?;
    Ok(Json(settings))
}

struct SettingsApiError(StorageError);

impl From<StorageError> for SettingsApiError {
    fn from(e: StorageError) -> Self {
        SettingsApiError(e)
    }
}

impl IntoResponse for SettingsApiError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(error = %self.0, "Settings API storage error");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
    }
}
