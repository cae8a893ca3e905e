use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted trend narrative. Stories are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoryRow {
    pub id: Uuid,
    pub title: String,
    pub narrative: String,
    pub report: Value,
    pub created_at: DateTime<Utc>,
}
