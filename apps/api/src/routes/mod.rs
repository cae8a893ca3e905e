pub mod health;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::auth::require_session;
use crate::data::handle_clear_data;
use crate::ingest::handlers as ingest;
use crate::profiles::handlers as profiles;
use crate::settings::handlers as settings;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Import
        .route(
            "/api/genkit/flow/processCustomerData",
            post(ingest::handle_process_customer_data),
        )
        .route(
            "/api/genkit/flow/generateColumnMapping",
            post(ingest::handle_generate_column_mapping),
        )
        // Profiles
        .route("/api/customer-profiles", get(profiles::handle_list_profiles))
        .route(
            "/api/customer-profiles/:id/feedback",
            post(profiles::handle_feedback),
        )
        .route("/api/export/customers", get(profiles::handle_export_customers))
        // Segments and collateral
        .route(
            "/api/customer-segments",
            get(analysis::handle_list_segments).post(analysis::handle_generate_segments),
        )
        .route(
            "/api/customer-segments/:id/roi",
            patch(analysis::handle_set_roi),
        )
        .route(
            "/api/export/campaign-brief",
            post(analysis::handle_campaign_brief),
        )
        .route(
            "/api/export/sales-script",
            post(analysis::handle_sales_script),
        )
        .route(
            "/api/export/content-calendar",
            post(analysis::handle_content_calendar),
        )
        .route(
            "/api/analytics-insights",
            get(analysis::handle_list_insights).post(analysis::handle_generate_insights),
        )
        // Settings and maintenance
        .route(
            "/api/settings",
            get(settings::handle_get_settings).post(settings::handle_save_settings),
        )
        .route("/api/data/clear", post(handle_clear_data))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(api)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::auth::AuthState;
    use crate::enrichment::synthesizer::tests::{CountingModel, CountingSource};

    const TOKEN: &str = "test-session";

    // The pool never connects; every request below is answered before the DB.
    fn app() -> Router {
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/affinity_test")
            .unwrap();
        build_router(AppState {
            db,
            llm: Arc::new(CountingModel::failing()),
            correlations: Arc::new(CountingSource::with(None)),
            auth: AuthState::with_tokens([TOKEN.to_string()]),
        })
    }

    fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let resp = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_session() {
        let resp = app()
            .oneshot(
                Request::get("/api/customer-profiles")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let resp = app()
            .oneshot(post_json("/api/data/clear", json!({}), Some("nope")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_feedback_two_is_a_validation_error() {
        let uri = format!("/api/customer-profiles/{}/feedback", uuid::Uuid::new_v4());
        let resp = app()
            .oneshot(post_json(&uri, json!({"feedback": 2}), Some(TOKEN)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_mapping_target_is_rejected_before_import() {
        let resp = app()
            .oneshot(post_json(
                "/api/genkit/flow/processCustomerData",
                json!({"csvData": "age\n30", "columnMapping": {"age": "birthday"}}),
                Some(TOKEN),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_csv_is_rejected() {
        let resp = app()
            .oneshot(post_json(
                "/api/genkit/flow/processCustomerData",
                json!({"csvData": "age", "columnMapping": {"age": "age_range"}}),
                Some(TOKEN),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["error"]["message"], "No valid records found in CSV data");
    }

    #[tokio::test]
    async fn test_heuristic_column_mapping() {
        let resp = app()
            .oneshot(post_json(
                "/api/genkit/flow/generateColumnMapping",
                json!({
                    "headers": ["Age Group", "Avg Spend", "Notes"],
                    "previewData": [["25-34", "High", "n/a"]],
                    "strategy": "heuristic"
                }),
                Some(TOKEN),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["Age Group"], "age_range");
        assert_eq!(body["Avg Spend"], "spending_level");
        assert_eq!(body["Notes"], "");
    }

    #[tokio::test]
    async fn test_ai_mapping_falls_back_when_model_fails() {
        let resp = app()
            .oneshot(post_json(
                "/api/genkit/flow/generateColumnMapping",
                json!({"headers": ["visit_frequency"], "previewData": []}),
                Some(TOKEN),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["visit_frequency"], "interaction_frequency");
    }
}
