use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::store::list_segments;
use crate::errors::AppError;
use crate::models::customer::CustomerProfileRow;
use crate::profiles::export::render_customers_csv;
use crate::profiles::store::{list_profiles, set_feedback};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: i16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub accuracy_feedback: i16,
}

/// Only thumbs-down (-1) and thumbs-up (+1) are accepted from callers.
pub fn validate_feedback(feedback: i16) -> Result<i16, AppError> {
    match feedback {
        -1 | 1 => Ok(feedback),
        other => Err(AppError::Validation(format!(
            "feedback must be -1 or 1, got {other}"
        ))),
    }
}

/// GET /api/customer-profiles
pub async fn handle_list_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerProfileRow>>, AppError> {
    let profiles = list_profiles(&state.db).await?;
    Ok(Json(profiles))
}

/// POST /api/customer-profiles/:id/feedback
pub async fn handle_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let feedback = validate_feedback(req.feedback)?;

    let updated = set_feedback(&state.db, id, feedback)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Customer profile {id} not found")))?;

    info!("Recorded feedback {feedback} for profile {id}");
    Ok(Json(FeedbackResponse {
        id: updated.id,
        accuracy_feedback: updated.accuracy_feedback.unwrap_or(feedback),
    }))
}

/// GET /api/export/customers
pub async fn handle_export_customers(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let profiles = list_profiles(&state.db).await?;
    let segments = list_segments(&state.db).await?;
    let csv = render_customers_csv(&profiles, &segments);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"customers.csv\"",
            ),
        ],
        csv,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_accepts_plus_and_minus_one() {
        assert_eq!(validate_feedback(1).unwrap(), 1);
        assert_eq!(validate_feedback(-1).unwrap(), -1);
    }

    #[test]
    fn test_feedback_rejects_other_values() {
        for bad in [0, 2, -2] {
            assert!(matches!(
                validate_feedback(bad),
                Err(AppError::Validation(_))
            ));
        }
    }
}
