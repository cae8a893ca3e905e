use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::llm_client::Validate;

/// Fixed order of the six Cultural DNA categories. Also the tie-break order
/// when ranking a profile's top affinities.
pub const DNA_CATEGORIES: [&str; 6] = [
    "music",
    "entertainment",
    "dining",
    "fashion",
    "travel",
    "lifestyle",
];

/// Affinity for one cultural category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAffinity {
    /// 0–100
    pub score: f64,
    pub preferences: Vec<String>,
}

impl CategoryAffinity {
    fn empty() -> Self {
        Self {
            score: 0.0,
            preferences: vec![],
        }
    }
}

/// Six-category affinity profile synthesized for a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalDna {
    pub music: CategoryAffinity,
    pub entertainment: CategoryAffinity,
    pub dining: CategoryAffinity,
    pub fashion: CategoryAffinity,
    pub travel: CategoryAffinity,
    pub lifestyle: CategoryAffinity,
    pub surprise_connections: Vec<String>,
    /// 0–100
    pub confidence_score: f64,
}

impl CulturalDna {
    /// Zero-score profile carrying an explanatory note instead of connections.
    pub fn placeholder(note: &str, confidence_score: f64) -> Self {
        Self {
            music: CategoryAffinity::empty(),
            entertainment: CategoryAffinity::empty(),
            dining: CategoryAffinity::empty(),
            fashion: CategoryAffinity::empty(),
            travel: CategoryAffinity::empty(),
            lifestyle: CategoryAffinity::empty(),
            surprise_connections: vec![note.to_string()],
            confidence_score,
        }
    }

    /// Categories paired with their names, in `DNA_CATEGORIES` order.
    pub fn categories(&self) -> [(&'static str, &CategoryAffinity); 6] {
        [
            (DNA_CATEGORIES[0], &self.music),
            (DNA_CATEGORIES[1], &self.entertainment),
            (DNA_CATEGORIES[2], &self.dining),
            (DNA_CATEGORIES[3], &self.fashion),
            (DNA_CATEGORIES[4], &self.travel),
            (DNA_CATEGORIES[5], &self.lifestyle),
        ]
    }

    /// Names of the `n` highest-scoring categories. Zero scores are skipped;
    /// ties keep the fixed category order.
    pub fn top_categories(&self, n: usize) -> Vec<&'static str> {
        let mut ranked: Vec<_> = self
            .categories()
            .into_iter()
            .filter(|(_, affinity)| affinity.score > 0.0)
            .collect();
        // stable sort keeps DNA_CATEGORIES order for equal scores
        ranked.sort_by(|a, b| b.1.score.total_cmp(&a.1.score));
        ranked.into_iter().take(n).map(|(name, _)| name).collect()
    }
}

impl Validate for CulturalDna {
    fn validate(self) -> Result<Self, String> {
        for (name, affinity) in self.categories() {
            if !affinity.score.is_finite() || !(0.0..=100.0).contains(&affinity.score) {
                return Err(format!(
                    "{name} score {} is outside 0-100",
                    affinity.score
                ));
            }
        }
        if !self.confidence_score.is_finite() || !(0.0..=100.0).contains(&self.confidence_score) {
            return Err(format!(
                "confidenceScore {} is outside 0-100",
                self.confidence_score
            ));
        }
        Ok(self)
    }
}

/// Persisted customer profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfileRow {
    pub id: Uuid,
    pub age_range: Option<String>,
    pub spending_level: Option<String>,
    pub purchase_categories: Vec<String>,
    pub interaction_frequency: Option<String>,
    pub cultural_dna: Option<Json<CulturalDna>>,
    /// -1, 0 or +1
    pub accuracy_feedback: Option<i16>,
    /// Row position within the import batch that created this profile.
    pub import_position: i32,
    pub created_at: DateTime<Utc>,
}

impl CustomerProfileRow {
    pub fn dna(&self) -> Option<&CulturalDna> {
        self.cultural_dna.as_ref().map(|j| &j.0)
    }
}

/// A profile built by the import pipeline, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomerProfile {
    pub age_range: Option<String>,
    pub spending_level: Option<String>,
    pub purchase_categories: Vec<String>,
    pub interaction_frequency: Option<String>,
    pub cultural_dna: Option<CulturalDna>,
}
