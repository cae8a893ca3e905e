mod analysis;
mod auth;
mod config;
mod data;
mod db;
mod enrichment;
mod errors;
mod ingest;
mod llm_client;
mod models;
mod profiles;
mod routes;
mod settings;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::AuthState;
use crate::config::Config;
use crate::db::create_pool;
use crate::enrichment::correlation::{ClientCredentials, TasteGraphClient};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Affinity API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize taste-graph client; client credentials switch it to bearer tokens
    let credentials = match (&config.taste_client_id, &config.taste_client_secret) {
        (Some(id), Some(secret)) => Some(ClientCredentials {
            client_id: id.clone(),
            client_secret: secret.clone(),
        }),
        _ => None,
    };
    let uses_oauth = credentials.is_some();
    let correlations = TasteGraphClient::new(
        config.taste_api_url.clone(),
        config.taste_api_key.clone(),
        credentials,
    )?;
    info!(
        "Taste-graph client initialized ({})",
        if uses_oauth { "client credentials" } else { "api key" }
    );

    let auth = AuthState::from_config(&config)?;

    // Build app state
    let state = AppState {
        db,
        llm: Arc::new(llm),
        correlations: Arc::new(correlations),
        auth,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
