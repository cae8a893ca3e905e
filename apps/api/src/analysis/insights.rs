//! Analytics insights: a trend report over the profile corpus, appended to
//! the story history.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::analysis::prompts::{INSIGHTS_PROMPT_TEMPLATE, INSIGHTS_ROLE};
use crate::analysis::sampling::{
    overview, sample_profiles, settings_context, summarize, ProfileSummary, INSIGHT_SAMPLE_CAP,
};
use crate::analysis::segments::NO_PROFILES_MESSAGE;
use crate::analysis::store::insert_story;
use crate::errors::AppError;
use crate::llm_client::prompts::{json_system, EVIDENCE_INSTRUCTION};
use crate::llm_client::{request_validated, GenerativeModel, Validate};
use crate::models::customer::CustomerProfileRow;
use crate::models::settings::SettingsRow;
use crate::models::story::StoryRow;
use crate::profiles::store::list_profiles;
use crate::settings::store::get_settings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub title: String,
    pub summary: String,
    pub trends: Vec<Trend>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl Validate for TrendReport {
    fn validate(self) -> Result<Self, String> {
        if self.title.trim().is_empty() {
            return Err("trend report has no title".to_string());
        }
        if self.summary.trim().is_empty() {
            return Err("trend report has no summary".to_string());
        }
        if self.trends.is_empty() {
            return Err("trend report has no trends".to_string());
        }
        if self.trends.iter().any(|t| t.name.trim().is_empty()) {
            return Err("trend with empty name".to_string());
        }
        Ok(self)
    }
}

/// Generates a trend report and appends it as a story.
pub async fn generate_insights(
    pool: &PgPool,
    model: &dyn GenerativeModel,
) -> Result<StoryRow, AppError> {
    let profiles = list_profiles(pool).await?;
    if profiles.is_empty() {
        return Err(AppError::Validation(NO_PROFILES_MESSAGE.to_string()));
    }
    let settings = get_settings(pool).await?;

    let prompt = build_insights_prompt(&profiles, settings.as_ref())?;
    let report: TrendReport =
        request_validated(model, &prompt, &json_system(INSIGHTS_ROLE)).await?;
    info!("Trend report '{}' with {} trends", report.title, report.trends.len());

    let value = serde_json::to_value(&report).map_err(|e| AppError::Internal(e.into()))?;
    let story = insert_story(pool, &report.title, &report.summary, &value).await?;
    Ok(story)
}

pub fn build_insights_prompt(
    profiles: &[CustomerProfileRow],
    settings: Option<&SettingsRow>,
) -> Result<String, AppError> {
    let sample = sample_profiles(profiles, INSIGHT_SAMPLE_CAP);
    let summaries: Vec<ProfileSummary> = sample.iter().map(summarize).collect();

    let overview_json = serde_json::to_string_pretty(&overview(profiles, sample.len()))
        .map_err(|e| AppError::Internal(e.into()))?;
    let profiles_json =
        serde_json::to_string(&summaries).map_err(|e| AppError::Internal(e.into()))?;

    let prompt = INSIGHTS_PROMPT_TEMPLATE
        .replace("{overview_json}", &overview_json)
        .replace("{profiles_json}", &profiles_json)
        .replace("{settings_context}", &settings_context(settings));
    Ok(format!("{prompt}\n\n{EVIDENCE_INSTRUCTION}"))
}
