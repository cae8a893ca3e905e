use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Business baseline metrics. A single row exists, keyed by the `singleton`
/// sentinel column; it is not exposed on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRow {
    pub average_order_value: Option<f64>,
    pub customer_lifetime_value: Option<f64>,
    pub monthly_marketing_budget: Option<f64>,
    /// Percentage, 0–100.
    pub conversion_rate: Option<f64>,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}
