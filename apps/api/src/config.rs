use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub taste_api_url: String,
    pub taste_api_key: String,
    /// Client-credentials pair for the taste API. When both are set the
    /// correlation client exchanges them for short-lived bearer tokens.
    pub taste_client_id: Option<String>,
    pub taste_client_secret: Option<String>,
    pub session_tokens: Vec<String>,
    pub app_env: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            taste_api_url: require_env("TASTE_API_URL")?,
            taste_api_key: require_env("TASTE_API_KEY")?,
            taste_client_id: optional_env("TASTE_CLIENT_ID"),
            taste_client_secret: optional_env("TASTE_CLIENT_SECRET"),
            session_tokens: parse_token_list(&std::env::var("SESSION_TOKENS").unwrap_or_default()),
            app_env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Splits a comma-separated token list, dropping blanks.
fn parse_token_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_list_trims_and_drops_blanks() {
        assert_eq!(
            parse_token_list(" abc , ,def,"),
            vec!["abc".to_string(), "def".to_string()]
        );
    }

    #[test]
    fn test_parse_token_list_empty() {
        assert!(parse_token_list("").is_empty());
    }
}
