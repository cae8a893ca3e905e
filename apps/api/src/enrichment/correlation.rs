//! Correlation client: queries the taste-graph API for category correlations.
//!
//! Unavailability is a normal, degraded state for the import pipeline, so the
//! client never returns an error: every failure is logged and reported as `None`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Tokens are treated as expired this long before the server says they are.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// A weighted correlation between a purchase category and a cultural entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlation {
    pub category: String,
    pub name: String,
    pub correlation_score: f64,
}

/// Source of taste correlations. Carried in `AppState` as
/// `Arc<dyn CorrelationSource>` so flows can be exercised with test doubles.
#[async_trait]
pub trait CorrelationSource: Send + Sync {
    /// Returns correlations for `categories`, or `None` when the service is
    /// unavailable or has nothing to say.
    async fn correlations(&self, categories: &[String]) -> Option<Vec<Correlation>>;
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Short-lived bearer token cache owned by one client. Reading refreshes the
/// token when it is missing or about to expire.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token, calling `fetch` for a new one when needed.
    /// `fetch` yields `(token, lifetime)`.
    pub async fn get_or_refresh<F, Fut, E>(&self, fetch: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(String, Duration), E>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            if Instant::now() + TOKEN_EXPIRY_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let (value, lifetime) = fetch().await?;
        *slot = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }
}

/// Client-credentials pair for the token exchange.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Serialize)]
struct CorrelationRequest<'a> {
    interests: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CorrelationResponse {
    results: Vec<CorrelationResult>,
}

#[derive(Debug, Deserialize)]
struct CorrelationResult {
    category: String,
    name: String,
    score: f64,
}

/// HTTP client for the taste-graph API.
pub struct TasteGraphClient {
    client: Client,
    base_url: String,
    api_key: String,
    credentials: Option<ClientCredentials>,
    tokens: TokenCache,
}

impl TasteGraphClient {
    pub fn new(
        base_url: String,
        api_key: String,
        credentials: Option<ClientCredentials>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            credentials,
            tokens: TokenCache::new(),
        })
    }

    async fn fetch_token(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<(String, Duration), reqwest::Error> {
        debug!("Requesting taste API access token");
        let token: TokenResponse = self
            .client
            .post(format!("{}/oauth/token", self.base_url))
            .json(&TokenRequest {
                grant_type: "client_credentials",
                client_id: &credentials.client_id,
                client_secret: &credentials.client_secret,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok((token.access_token, Duration::from_secs(token.expires_in)))
    }

    async fn request(&self, categories: &[String]) -> Result<Vec<Correlation>, reqwest::Error> {
        let mut request = self
            .client
            .post(format!("{}/v1/correlations", self.base_url))
            .json(&CorrelationRequest {
                interests: categories,
            });

        request = match &self.credentials {
            Some(credentials) => {
                let token = self
                    .tokens
                    .get_or_refresh(|| self.fetch_token(credentials))
                    .await?;
                request.bearer_auth(token)
            }
            None => request.header("x-api-key", &self.api_key),
        };

        let response = request.send().await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            // the next read fetches a fresh token
            self.tokens.clear().await;
        }
        let body: CorrelationResponse = response.error_for_status()?.json().await?;

        Ok(body
            .results
            .into_iter()
            .map(|r| Correlation {
                category: r.category,
                name: r.name,
                correlation_score: r.score,
            })
            .collect())
    }
}

#[async_trait]
impl CorrelationSource for TasteGraphClient {
    async fn correlations(&self, categories: &[String]) -> Option<Vec<Correlation>> {
        if categories.is_empty() {
            return None;
        }
        match self.request(categories).await {
            Ok(results) if results.is_empty() => {
                debug!("Taste API returned no correlations for {categories:?}");
                None
            }
            Ok(results) => Some(results),
            Err(e) => {
                warn!("Taste API unavailable: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn categories() -> Vec<String> {
        vec!["jazz".to_string(), "coffee".to_string()]
    }

    fn correlation_body() -> serde_json::Value {
        json!({
            "results": [
                {"category": "music", "name": "Bossa Nova", "score": 0.91},
                {"category": "dining", "name": "Third-wave cafes", "score": 0.77}
            ]
        })
    }

    fn credentials() -> Option<ClientCredentials> {
        Some(ClientCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        })
    }

    #[tokio::test]
    async fn test_api_key_mode_maps_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/correlations"))
            .and(header("x-api-key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(correlation_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = TasteGraphClient::new(server.uri(), "k".to_string(), None).unwrap();
        let results = client.correlations(&categories()).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Bossa Nova");
        assert!((results[0].correlation_score - 0.91).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_token_is_reused_while_fresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "tok-1", "expires_in": 3600})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/correlations"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(correlation_body()))
            .expect(2)
            .mount(&server)
            .await;

        let client = TasteGraphClient::new(server.uri(), "k".to_string(), credentials()).unwrap();
        assert!(client.correlations(&categories()).await.is_some());
        assert!(client.correlations(&categories()).await.is_some());
    }

    #[tokio::test]
    async fn test_token_near_expiry_is_refreshed_on_read() {
        let server = MockServer::start().await;
        // lifetime inside the safety margin: every read refreshes
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "short", "expires_in": 30})),
            )
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/correlations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(correlation_body()))
            .expect(2)
            .mount(&server)
            .await;

        let client = TasteGraphClient::new(server.uri(), "k".to_string(), credentials()).unwrap();
        client.correlations(&categories()).await;
        client.correlations(&categories()).await;
    }

    #[tokio::test]
    async fn test_server_error_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/correlations"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = TasteGraphClient::new(server.uri(), "k".to_string(), None).unwrap();
        assert!(client.correlations(&categories()).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_results_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/correlations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let client = TasteGraphClient::new(server.uri(), "k".to_string(), None).unwrap();
        assert!(client.correlations(&categories()).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_categories_skip_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(correlation_body()))
            .expect(0)
            .mount(&server)
            .await;

        let client = TasteGraphClient::new(server.uri(), "k".to_string(), None).unwrap();
        assert!(client.correlations(&[]).await.is_none());
    }

    #[tokio::test]
    async fn test_token_cache_propagates_fetch_error() {
        let cache = TokenCache::new();
        let result: Result<String, &str> = cache.get_or_refresh(|| async { Err("down") }).await;
        assert_eq!(result, Err("down"));
        let result: Result<String, &str> = cache
            .get_or_refresh(|| async { Ok(("fresh".to_string(), Duration::from_secs(600))) })
            .await;
        assert_eq!(result, Ok("fresh".to_string()));
    }
}
