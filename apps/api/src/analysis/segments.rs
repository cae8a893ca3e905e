//! Customer segmentation.
//!
//! Flow: list profiles → truncate to SEGMENT_SAMPLE_CAP → summarize →
//!       LLM segments + campaign ideas → validate → sort by rank →
//!       replace stored segments and campaigns.

use std::collections::HashSet;

use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crate::analysis::prompts::{SEGMENTS_PROMPT_TEMPLATE, SEGMENTS_ROLE};
use crate::analysis::sampling::{
    overview, sample_profiles, settings_context, summarize, ProfileSummary, SEGMENT_SAMPLE_CAP,
};
use crate::analysis::store::replace_segments_and_campaigns;
use crate::errors::AppError;
use crate::llm_client::prompts::{json_system, EVIDENCE_INSTRUCTION};
use crate::llm_client::{request_validated, GenerativeModel, Validate};
use crate::models::customer::CustomerProfileRow;
use crate::models::segment::{SegmentRow, ValueTier};
use crate::models::settings::SettingsRow;
use crate::profiles::store::list_profiles;
use crate::settings::store::get_settings;

pub const MAX_CHARACTERISTICS: usize = 5;

pub const NO_PROFILES_MESSAGE: &str =
    "No customer profiles found. Import customer data before running this analysis.";

// ────────────────────────────────────────────────────────────────────────────
// Model output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSegment {
    pub name: String,
    pub size: i32,
    pub value_tier: ValueTier,
    pub characteristics: Vec<String>,
    #[serde(default)]
    pub recommended_channels: Vec<String>,
    pub messaging: String,
    pub business_opportunity_rank: i32,
    #[serde(default)]
    pub bias_warning: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignIdea {
    pub segment_name: String,
    pub title: String,
    pub description: String,
    pub channel: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationResult {
    pub segments: Vec<GeneratedSegment>,
    #[serde(default)]
    pub campaign_ideas: Vec<CampaignIdea>,
}

impl Validate for SegmentationResult {
    /// Rejects empty or mis-ranked output. Normalizes the rest: segments come
    /// back sorted by rank, characteristics capped, and ideas for unknown
    /// segments dropped.
    fn validate(mut self) -> Result<Self, String> {
        if self.segments.is_empty() {
            return Err("model returned no segments".to_string());
        }

        let mut names = HashSet::new();
        for s in &mut self.segments {
            s.name = s.name.trim().to_string();
            if s.name.is_empty() {
                return Err("segment with empty name".to_string());
            }
            if !names.insert(s.name.to_lowercase()) {
                return Err(format!("duplicate segment name '{}'", s.name));
            }
            if s.size < 0 {
                return Err(format!("segment '{}' has negative size", s.name));
            }
            s.characteristics.retain(|c| !c.trim().is_empty());
            s.characteristics.truncate(MAX_CHARACTERISTICS);
            s.bias_warning = s
                .bias_warning
                .take()
                .filter(|w| !w.trim().is_empty());
        }

        let n = self.segments.len() as i32;
        let mut ranks: Vec<i32> = self
            .segments
            .iter()
            .map(|s| s.business_opportunity_rank)
            .collect();
        ranks.sort_unstable();
        if ranks.iter().zip(1..=n).any(|(rank, expected)| *rank != expected) {
            return Err(format!(
                "businessOpportunityRank values {ranks:?} are not a permutation of 1..{n}"
            ));
        }

        self.segments.sort_by_key(|s| s.business_opportunity_rank);
        self.campaign_ideas
            .retain(|idea| names.contains(&idea.segment_name.trim().to_lowercase()));

        Ok(self)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Segmentation flow
// ────────────────────────────────────────────────────────────────────────────

/// Regenerates segments from the current profiles. Prior segments and
/// campaigns are replaced only once the model output validates.
pub async fn generate_segments(
    pool: &PgPool,
    model: &dyn GenerativeModel,
) -> Result<Vec<SegmentRow>, AppError> {
    let profiles = list_profiles(pool).await?;
    if profiles.is_empty() {
        return Err(AppError::Validation(NO_PROFILES_MESSAGE.to_string()));
    }
    let settings = get_settings(pool).await?;

    let prompt = build_segments_prompt(&profiles, settings.as_ref())?;
    let result: SegmentationResult =
        request_validated(model, &prompt, &json_system(SEGMENTS_ROLE)).await?;
    info!(
        "Model produced {} segments and {} campaign ideas",
        result.segments.len(),
        result.campaign_ideas.len()
    );

    let rows =
        replace_segments_and_campaigns(pool, &result.segments, &result.campaign_ideas).await?;
    Ok(rows)
}

pub fn build_segments_prompt(
    profiles: &[CustomerProfileRow],
    settings: Option<&SettingsRow>,
) -> Result<String, AppError> {
    let sample = sample_profiles(profiles, SEGMENT_SAMPLE_CAP);
    let summaries: Vec<ProfileSummary> = sample.iter().map(summarize).collect();
    let overview = overview(profiles, sample.len());
    info!(
        "Segmenting {} of {} profiles",
        sample.len(),
        profiles.len()
    );

    let overview_json =
        serde_json::to_string_pretty(&overview).map_err(|e| AppError::Internal(e.into()))?;
    let profiles_json =
        serde_json::to_string(&summaries).map_err(|e| AppError::Internal(e.into()))?;

    let prompt = SEGMENTS_PROMPT_TEMPLATE
        .replace("{overview_json}", &overview_json)
        .replace("{profiles_json}", &profiles_json)
        .replace("{settings_context}", &settings_context(settings));
    Ok(format!("{prompt}\n\n{EVIDENCE_INSTRUCTION}"))
}
