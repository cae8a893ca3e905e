use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::AuthState;
use crate::enrichment::correlation::CorrelationSource;
use crate::llm_client::GenerativeModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Generative model used by the mapper, synthesizer and analyzers.
    pub llm: Arc<dyn GenerativeModel>,
    /// Taste-correlation source. Default: TasteGraphClient.
    pub correlations: Arc<dyn CorrelationSource>,
    pub auth: AuthState,
}
