use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::settings::SettingsRow;
use crate::settings::store::{get_settings, upsert_settings, SettingsUpdate};
use crate::state::AppState;

/// GET /api/settings
/// `null` until settings are first saved.
pub async fn handle_get_settings(
    State(state): State<AppState>,
) -> Result<Json<Option<SettingsRow>>, AppError> {
    Ok(Json(get_settings(&state.db).await?))
}

/// POST /api/settings
pub async fn handle_save_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsRow>, AppError> {
    let update = update.validate()?;
    let saved = upsert_settings(&state.db, &update).await?;
    tracing::info!("Business settings updated");
    Ok(Json(saved))
}
