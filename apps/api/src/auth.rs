//! Session gating for every `/api` route.
//!
//! Sessions are opaque bearer tokens issued by the external auth provider and
//! listed in `SESSION_TOKENS`.

use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::Config;
use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct AuthState {
    tokens: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Empty token list: gating disabled in development, startup error elsewhere.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let tokens: HashSet<String> = config.session_tokens.iter().cloned().collect();

        if tokens.is_empty() {
            if config.is_development() {
                tracing::warn!("SESSION_TOKENS not set; session auth disabled in development");
                return Ok(Self::disabled());
            }
            anyhow::bail!("SESSION_TOKENS is required outside development");
        }

        Ok(Self::with_tokens(tokens))
    }

    pub fn with_tokens(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: Arc::new(tokens.into_iter().collect()),
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            tokens: Arc::new(HashSet::new()),
            enabled: false,
        }
    }

    fn allows(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}

/// Rejects requests without a known session token before any handler runs.
pub async fn require_session(State(auth): State<AuthState>, req: Request, next: Next) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => AppError::Unauthorized.into_response(),
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
