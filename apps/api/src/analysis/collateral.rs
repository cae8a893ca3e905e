//! Ephemeral marketing collateral: campaign briefs and sales scripts for one
//! segment, and a content calendar across all segments. Nothing here is stored.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::analysis::prompts::{
    BRIEF_PROMPT_TEMPLATE, BRIEF_ROLE, CALENDAR_PROMPT_TEMPLATE, CALENDAR_ROLE,
    SCRIPT_PROMPT_TEMPLATE, SCRIPT_ROLE,
};
use crate::analysis::sampling::{
    overview, sample_profiles, settings_context, summarize, ProfileSummary, CALENDAR_SAMPLE_CAP,
};
use crate::analysis::store::{find_segment_by_name, list_segments};
use crate::errors::AppError;
use crate::llm_client::prompts::{json_system, EVIDENCE_INSTRUCTION};
use crate::llm_client::{request_validated, GenerativeModel, LlmError, Validate};
use crate::models::customer::CustomerProfileRow;
use crate::models::segment::SegmentRow;
use crate::models::settings::SettingsRow;
use crate::profiles::store::list_profiles;
use crate::settings::store::get_settings;

pub const CALENDAR_WEEKS: u8 = 4;

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignBrief {
    /// Filled from the stored segment, not the model.
    #[serde(default)]
    pub segment_name: String,
    pub headline: String,
    pub objective: String,
    pub key_messages: Vec<String>,
    pub channels: Vec<String>,
    pub call_to_action: String,
    #[serde(default)]
    pub success_metrics: Vec<String>,
}

impl Validate for CampaignBrief {
    fn validate(self) -> Result<Self, String> {
        if self.headline.trim().is_empty() || self.objective.trim().is_empty() {
            return Err("campaign brief needs a headline and objective".to_string());
        }
        if self.key_messages.is_empty() {
            return Err("campaign brief has no key messages".to_string());
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectionResponse {
    pub objection: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesScript {
    #[serde(default)]
    pub segment_name: String,
    pub opening: String,
    pub discovery_questions: Vec<String>,
    pub value_propositions: Vec<String>,
    #[serde(default)]
    pub objection_handling: Vec<ObjectionResponse>,
    pub closing: String,
}

impl Validate for SalesScript {
    fn validate(self) -> Result<Self, String> {
        if self.opening.trim().is_empty() || self.closing.trim().is_empty() {
            return Err("sales script needs an opening and closing".to_string());
        }
        if self.value_propositions.is_empty() {
            return Err("sales script has no value propositions".to_string());
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub day: String,
    pub segment_name: String,
    pub channel: String,
    pub content_idea: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarWeek {
    pub week: u8,
    pub theme: String,
    pub entries: Vec<CalendarEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCalendar {
    pub weeks: Vec<CalendarWeek>,
}

impl Validate for ContentCalendar {
    /// Exactly four weeks, numbered 1-4. Returned sorted by week.
    fn validate(mut self) -> Result<Self, String> {
        self.weeks.sort_by_key(|w| w.week);
        let numbers: Vec<u8> = self.weeks.iter().map(|w| w.week).collect();
        let expected: Vec<u8> = (1..=CALENDAR_WEEKS).collect();
        if numbers != expected {
            return Err(format!("calendar weeks {numbers:?} must be exactly 1-{CALENDAR_WEEKS}"));
        }
        if self.weeks.iter().all(|w| w.entries.is_empty()) {
            return Err("calendar has no entries".to_string());
        }
        Ok(self)
    }
}

impl ContentCalendar {
    /// Drops entries naming a segment that does not exist. Matching is
    /// case-insensitive; kept entries get the stored spelling.
    fn retain_known_segments(&mut self, segments: &[SegmentRow]) -> usize {
        let mut dropped = 0;
        for week in &mut self.weeks {
            let before = week.entries.len();
            week.entries.retain_mut(|entry| {
                let wanted = entry.segment_name.trim().to_lowercase();
                match segments.iter().find(|s| s.name.to_lowercase() == wanted) {
                    Some(s) => {
                        entry.segment_name = s.name.clone();
                        true
                    }
                    None => false,
                }
            });
            dropped += before - week.entries.len();
        }
        dropped
    }

    /// Like `retain_known_segments`, but a calendar left with no entries at
    /// all is a schema failure.
    fn into_known_segments(mut self, segments: &[SegmentRow]) -> Result<Self, LlmError> {
        let dropped = self.retain_known_segments(segments);
        if dropped > 0 {
            warn!("Dropped {dropped} calendar entries for unknown segments");
        }
        if self.weeks.iter().all(|w| w.entries.is_empty()) {
            return Err(LlmError::Schema(
                "calendar has no entries for known segments".to_string(),
            ));
        }
        Ok(self)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Flows
// ────────────────────────────────────────────────────────────────────────────

pub async fn generate_campaign_brief(
    pool: &PgPool,
    model: &dyn GenerativeModel,
    segment_name: &str,
) -> Result<CampaignBrief, AppError> {
    let segment = require_segment(pool, segment_name).await?;
    let prompt = build_segment_prompt(BRIEF_PROMPT_TEMPLATE, pool, &segment).await?;

    let mut brief: CampaignBrief =
        request_validated(model, &prompt, &json_system(BRIEF_ROLE)).await?;
    brief.segment_name = segment.name;
    info!("Campaign brief generated for '{}'", brief.segment_name);
    Ok(brief)
}

pub async fn generate_sales_script(
    pool: &PgPool,
    model: &dyn GenerativeModel,
    segment_name: &str,
) -> Result<SalesScript, AppError> {
    let segment = require_segment(pool, segment_name).await?;
    let prompt = build_segment_prompt(SCRIPT_PROMPT_TEMPLATE, pool, &segment).await?;

    let mut script: SalesScript =
        request_validated(model, &prompt, &json_system(SCRIPT_ROLE)).await?;
    script.segment_name = segment.name;
    info!("Sales script generated for '{}'", script.segment_name);
    Ok(script)
}

/// Four-week plan across the current segments.
pub async fn generate_content_calendar(
    pool: &PgPool,
    model: &dyn GenerativeModel,
) -> Result<ContentCalendar, AppError> {
    let segments = list_segments(pool).await?;
    if segments.is_empty() {
        return Err(AppError::Validation(
            "No segments found. Generate customer segments before planning content.".to_string(),
        ));
    }
    let profiles = list_profiles(pool).await?;
    let settings = get_settings(pool).await?;
    let sample = sample_profiles(&profiles, CALENDAR_SAMPLE_CAP);
    let summaries: Vec<ProfileSummary> = sample.iter().map(summarize).collect();

    let segments_json = serde_json::to_string_pretty(&segment_views(&segments))
        .map_err(|e| AppError::Internal(e.into()))?;
    let overview_json = serde_json::to_string_pretty(&overview(&profiles, sample.len()))
        .map_err(|e| AppError::Internal(e.into()))?;
    let profiles_json =
        serde_json::to_string(&summaries).map_err(|e| AppError::Internal(e.into()))?;
    let prompt = CALENDAR_PROMPT_TEMPLATE
        .replace("{segments_json}", &segments_json)
        .replace("{overview_json}", &overview_json)
        .replace("{profiles_json}", &profiles_json)
        .replace("{settings_context}", &settings_context(settings.as_ref()));
    let prompt = format!("{prompt}\n\n{EVIDENCE_INSTRUCTION}");

    let calendar: ContentCalendar =
        request_validated(model, &prompt, &json_system(CALENDAR_ROLE)).await?;
    let calendar = calendar.into_known_segments(&segments)?;
    info!("Content calendar generated across {} segments", segments.len());
    Ok(calendar)
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn require_segment(pool: &PgPool, name: &str) -> Result<SegmentRow, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("segmentName cannot be empty".to_string()));
    }
    find_segment_by_name(pool, name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Segment '{}' not found", name.trim())))
}

async fn build_segment_prompt(
    template: &str,
    pool: &PgPool,
    segment: &SegmentRow,
) -> Result<String, AppError> {
    let profiles = list_profiles(pool).await?;
    let settings = get_settings(pool).await?;
    render_segment_prompt(template, segment, &profiles, settings.as_ref())
}

/// Fills a single-segment template with the segment, the corpus overview
/// and a profile sample capped like the calendar's.
fn render_segment_prompt(
    template: &str,
    segment: &SegmentRow,
    profiles: &[CustomerProfileRow],
    settings: Option<&SettingsRow>,
) -> Result<String, AppError> {
    let sample = sample_profiles(profiles, CALENDAR_SAMPLE_CAP);
    let summaries: Vec<ProfileSummary> = sample.iter().map(summarize).collect();

    let segment_json = serde_json::to_string_pretty(&SegmentView::from(segment))
        .map_err(|e| AppError::Internal(e.into()))?;
    let overview_json = serde_json::to_string_pretty(&overview(profiles, sample.len()))
        .map_err(|e| AppError::Internal(e.into()))?;
    let profiles_json =
        serde_json::to_string(&summaries).map_err(|e| AppError::Internal(e.into()))?;
    let prompt = template
        .replace("{segment_json}", &segment_json)
        .replace("{overview_json}", &overview_json)
        .replace("{profiles_json}", &profiles_json)
        .replace("{settings_context}", &settings_context(settings));
    Ok(format!("{prompt}\n\n{EVIDENCE_INSTRUCTION}"))
}

/// Segment fields the model needs, without ids or timestamps.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SegmentView<'a> {
    name: &'a str,
    size: i32,
    value_tier: &'a str,
    characteristics: &'a [String],
    recommended_channels: &'a [String],
    messaging: &'a str,
    business_opportunity_rank: i32,
}

impl<'a> From<&'a SegmentRow> for SegmentView<'a> {
    fn from(s: &'a SegmentRow) -> Self {
        Self {
            name: &s.name,
            size: s.size,
            value_tier: &s.value_tier,
            characteristics: &s.characteristics,
            recommended_channels: &s.recommended_channels,
            messaging: &s.messaging,
            business_opportunity_rank: s.business_opportunity_rank,
        }
    }
}

fn segment_views(segments: &[SegmentRow]) -> Vec<SegmentView<'_>> {
    segments.iter().map(SegmentView::from).collect()
}
