//! Profile synthesizer: turns taste correlations into a Cultural DNA profile.
//!
//! The model is only called when there is something to synthesize from. Thin
//! inputs get a canned zero-score profile with a low fixed confidence.

use tracing::debug;

use crate::enrichment::correlation::{Correlation, CorrelationSource};
use crate::enrichment::prompts::{DNA_PROMPT_TEMPLATE, DNA_SYSTEM};
use crate::llm_client::{request_validated, GenerativeModel, LlmError};
use crate::models::customer::CulturalDna;

pub const NO_CATEGORIES_CONFIDENCE: f64 = 10.0;
pub const NO_CORRELATIONS_CONFIDENCE: f64 = 20.0;

pub const NO_CATEGORIES_NOTE: &str = "Not enough purchase data to build a cultural profile.";
pub const NO_CORRELATIONS_NOTE: &str =
    "Taste correlation data was unavailable for these purchase categories.";

/// Synthesizes DNA from `correlations`. Model failures (empty, malformed or
/// out-of-range output) are returned as errors.
pub async fn synthesize_dna(
    categories: &[String],
    correlations: Option<&[Correlation]>,
    model: &dyn GenerativeModel,
) -> Result<CulturalDna, LlmError> {
    if categories.is_empty() {
        return Ok(CulturalDna::placeholder(
            NO_CATEGORIES_NOTE,
            NO_CATEGORIES_CONFIDENCE,
        ));
    }

    let correlations = match correlations {
        Some(c) if !c.is_empty() => c,
        _ => {
            return Ok(CulturalDna::placeholder(
                NO_CORRELATIONS_NOTE,
                NO_CORRELATIONS_CONFIDENCE,
            ))
        }
    };

    let prompt = DNA_PROMPT_TEMPLATE
        .replace("{categories_json}", &serde_json::to_string(categories)?)
        .replace(
            "{correlations_json}",
            &serde_json::to_string_pretty(correlations)?,
        );

    debug!(
        "Synthesizing DNA from {} correlations for {} categories",
        correlations.len(),
        categories.len()
    );
    request_validated::<CulturalDna>(model, &prompt, DNA_SYSTEM).await
}

/// Queries `source` and synthesizes DNA for one customer's categories.
/// Empty categories never reach the correlation source.
pub async fn enrich_categories(
    categories: &[String],
    source: &dyn CorrelationSource,
    model: &dyn GenerativeModel,
) -> Result<CulturalDna, LlmError> {
    if categories.is_empty() {
        return synthesize_dna(categories, None, model).await;
    }
    let correlations = source.correlations(categories).await;
    synthesize_dna(categories, correlations.as_deref(), model).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub const VALID_DNA: &str = r#"{
        "music": {"score": 82, "preferences": ["Bossa Nova", "Cool jazz"]},
        "entertainment": {"score": 55, "preferences": ["Art-house film"]},
        "dining": {"score": 74, "preferences": ["Third-wave cafes"]},
        "fashion": {"score": 30, "preferences": []},
        "travel": {"score": 61, "preferences": ["Lisbon"]},
        "lifestyle": {"score": 40, "preferences": ["Vinyl collecting"]},
        "surpriseConnections": ["Jazz listeners over-index on specialty coffee"],
        "confidenceScore": 78
    }"#;

    /// Model double that counts calls and replies with a fixed result.
    pub struct CountingModel {
        pub reply: Result<String, ()>,
        pub calls: AtomicUsize,
    }

    impl CountingModel {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerativeModel for CountingModel {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|_| LlmError::EmptyContent)
        }
    }

    /// Correlation double that counts calls.
    pub struct CountingSource {
        pub results: Option<Vec<Correlation>>,
        pub calls: AtomicUsize,
    }

    impl CountingSource {
        pub fn with(results: Option<Vec<Correlation>>) -> Self {
            Self {
                results,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn available() -> Self {
            Self::with(Some(vec![Correlation {
                category: "music".to_string(),
                name: "Bossa Nova".to_string(),
                correlation_score: 0.9,
            }]))
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CorrelationSource for CountingSource {
        async fn correlations(&self, _categories: &[String]) -> Option<Vec<Correlation>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results.clone()
        }
    }

    fn cats(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_categories_skip_source_and_model() {
        let source = CountingSource::available();
        let model = CountingModel::replying(VALID_DNA);
        let dna = enrich_categories(&[], &source, &model).await.unwrap();
        assert_eq!(source.call_count(), 0);
        assert_eq!(model.call_count(), 0);
        assert_eq!(dna.confidence_score, NO_CATEGORIES_CONFIDENCE);
        assert_eq!(dna.surprise_connections, vec![NO_CATEGORIES_NOTE.to_string()]);
    }

    #[tokio::test]
    async fn test_missing_correlations_skip_model() {
        let source = CountingSource::with(None);
        let model = CountingModel::replying(VALID_DNA);
        let dna = enrich_categories(&cats(&["jazz"]), &source, &model).await.unwrap();
        assert_eq!(source.call_count(), 1);
        assert_eq!(model.call_count(), 0);
        assert_eq!(dna.confidence_score, NO_CORRELATIONS_CONFIDENCE);
        assert_eq!(dna.surprise_connections, vec![NO_CORRELATIONS_NOTE.to_string()]);
    }

    #[tokio::test]
    async fn test_empty_correlations_treated_as_missing() {
        let model = CountingModel::replying(VALID_DNA);
        let empty: Vec<Correlation> = vec![];
        let dna = synthesize_dna(&cats(&["jazz"]), Some(empty.as_slice()), &model)
            .await
            .unwrap();
        assert_eq!(model.call_count(), 0);
        assert_eq!(dna.confidence_score, NO_CORRELATIONS_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_valid_model_reply_becomes_dna() {
        let source = CountingSource::available();
        let model = CountingModel::replying(VALID_DNA);
        let dna = enrich_categories(&cats(&["jazz", "coffee"]), &source, &model)
            .await
            .unwrap();
        assert_eq!(model.call_count(), 1);
        assert_eq!(dna.confidence_score, 78.0);
        assert_eq!(dna.top_categories(1), vec!["music"]);
    }

    #[tokio::test]
    async fn test_malformed_model_reply_is_error() {
        let source = CountingSource::available();
        let model = CountingModel::replying("{\"music\": \"loud\"}");
        let result = enrich_categories(&cats(&["jazz"]), &source, &model).await;
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_reply_is_schema_error() {
        let source = CountingSource::available();
        let reply = VALID_DNA.replace("\"confidenceScore\": 78", "\"confidenceScore\": 178");
        let model = CountingModel::replying(&reply);
        let result = enrich_categories(&cats(&["jazz"]), &source, &model).await;
        assert!(matches!(result, Err(LlmError::Schema(_))));
    }
}
