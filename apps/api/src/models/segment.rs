use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Qualitative value tier of a segment. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueTier {
    High,
    Medium,
    Low,
}

impl ValueTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueTier::High => "high",
            ValueTier::Medium => "medium",
            ValueTier::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRow {
    pub id: Uuid,
    pub name: String,
    pub size: i32,
    pub value_tier: String,
    pub characteristics: Vec<String>,
    pub recommended_channels: Vec<String>,
    pub messaging: String,
    pub business_opportunity_rank: i32,
    pub bias_warning: Option<String>,
    pub actual_roi: Option<f64>,
    pub created_at: DateTime<Utc>,
}
