use axum::{extract::State, Json};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;

/// Rows removed per collection by a clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearedCounts {
    pub profiles: u64,
    pub segments: u64,
    pub campaigns: u64,
    pub stories: u64,
}

/// Wipes profiles, segments, campaigns and stories. Settings survive.
pub async fn clear_all_data(pool: &PgPool) -> anyhow::Result<ClearedCounts> {
    let mut tx = pool.begin().await?;

    let profiles = sqlx::query("DELETE FROM customer_profiles")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let campaigns = sqlx::query("DELETE FROM campaigns")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let segments = sqlx::query("DELETE FROM segments")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let stories = sqlx::query("DELETE FROM stories")
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    let counts = ClearedCounts {
        profiles,
        segments,
        campaigns,
        stories,
    };
    info!("Cleared all data: {counts:?}");
    Ok(counts)
}

/// POST /api/data/clear
pub async fn handle_clear_data(
    State(state): State<AppState>,
) -> Result<Json<ClearedCounts>, AppError> {
    Ok(Json(clear_all_data(&state.db).await?))
}
