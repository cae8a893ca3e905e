//! Axum route handlers for segmentation, insights and collateral.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::collateral::{
    generate_campaign_brief, generate_content_calendar, generate_sales_script, CampaignBrief,
    ContentCalendar, SalesScript,
};
use crate::analysis::insights::generate_insights;
use crate::analysis::segments::generate_segments;
use crate::analysis::store::{list_campaigns, list_segments, list_stories, set_actual_roi};
use crate::errors::AppError;
use crate::models::campaign::CampaignRow;
use crate::models::segment::SegmentRow;
use crate::models::story::StoryRow;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentsResponse {
    pub segments: Vec<SegmentRow>,
    pub campaigns: Vec<CampaignRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentNameRequest {
    pub segment_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiRequest {
    pub actual_roi: f64,
}

#[derive(Debug, Serialize)]
pub struct StoriesResponse {
    pub stories: Vec<StoryRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/customer-segments
pub async fn handle_generate_segments(
    State(state): State<AppState>,
) -> Result<Json<SegmentsResponse>, AppError> {
    let segments = generate_segments(&state.db, state.llm.as_ref()).await?;
    let campaigns = list_campaigns(&state.db).await?;
    Ok(Json(SegmentsResponse {
        segments,
        campaigns,
    }))
}

/// GET /api/customer-segments
pub async fn handle_list_segments(
    State(state): State<AppState>,
) -> Result<Json<SegmentsResponse>, AppError> {
    let segments = list_segments(&state.db).await?;
    let campaigns = list_campaigns(&state.db).await?;
    Ok(Json(SegmentsResponse {
        segments,
        campaigns,
    }))
}

/// PATCH /api/customer-segments/:id/roi
pub async fn handle_set_roi(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RoiRequest>,
) -> Result<Json<SegmentRow>, AppError> {
    if !req.actual_roi.is_finite() {
        return Err(AppError::Validation("actualRoi must be a finite number".to_string()));
    }
    set_actual_roi(&state.db, id, req.actual_roi)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Segment {id} not found")))
}

/// POST /api/export/campaign-brief
pub async fn handle_campaign_brief(
    State(state): State<AppState>,
    Json(req): Json<SegmentNameRequest>,
) -> Result<Json<CampaignBrief>, AppError> {
    let brief = generate_campaign_brief(&state.db, state.llm.as_ref(), &req.segment_name).await?;
    Ok(Json(brief))
}

/// POST /api/export/sales-script
pub async fn handle_sales_script(
    State(state): State<AppState>,
    Json(req): Json<SegmentNameRequest>,
) -> Result<Json<SalesScript>, AppError> {
    let script = generate_sales_script(&state.db, state.llm.as_ref(), &req.segment_name).await?;
    Ok(Json(script))
}

/// POST /api/export/content-calendar
pub async fn handle_content_calendar(
    State(state): State<AppState>,
) -> Result<Json<ContentCalendar>, AppError> {
    let calendar = generate_content_calendar(&state.db, state.llm.as_ref()).await?;
    Ok(Json(calendar))
}

/// POST /api/analytics-insights
pub async fn handle_generate_insights(
    State(state): State<AppState>,
) -> Result<Json<StoryRow>, AppError> {
    let story = generate_insights(&state.db, state.llm.as_ref()).await?;
    Ok(Json(story))
}

/// GET /api/analytics-insights
/// Story history, newest first.
pub async fn handle_list_insights(
    State(state): State<AppState>,
) -> Result<Json<StoriesResponse>, AppError> {
    let stories = list_stories(&state.db).await?;
    Ok(Json(StoriesResponse { stories }))
}
