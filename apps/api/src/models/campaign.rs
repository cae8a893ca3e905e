use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Campaign idea stub produced alongside each segmentation run.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRow {
    pub id: Uuid,
    pub segment_name: String,
    pub title: String,
    pub description: String,
    pub channel: String,
    pub created_at: DateTime<Utc>,
}
