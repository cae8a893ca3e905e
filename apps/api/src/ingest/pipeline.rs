//! Batch import: CSV text to persisted, enriched customer profiles.
//!
//! Flow: validate mapping → parse_csv → (per row, sequentially) enrich →
//!       replace the profile collection → summary.
//!
//! Enrichment failures never drop a row: the behavioral record is saved
//! without DNA. Only rows with no data at all are dropped.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::enrichment::correlation::CorrelationSource;
use crate::enrichment::synthesizer::enrich_categories;
use crate::errors::AppError;
use crate::ingest::csv::{parse_csv, CanonicalRecord};
use crate::ingest::mapping::ColumnMapping;
use crate::llm_client::GenerativeModel;
use crate::models::customer::NewCustomerProfile;
use crate::profiles::store::replace_profiles;

/// Import summary returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub records_processed: usize,
    pub profiles_created: usize,
    pub profiles_with_dna: usize,
    pub enrichment_failures: usize,
    pub save_failures: usize,
    /// Completeness of the parsed records (not the saved ones), 0–100.
    pub data_quality: f64,
}

/// Profiles built from parsed rows, before persistence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedBatch {
    pub profiles: Vec<NewCustomerProfile>,
    pub enrichment_failures: usize,
}

/// Runs the whole import and replaces the stored profile collection.
pub async fn process_customer_data(
    pool: &PgPool,
    source: &dyn CorrelationSource,
    model: &dyn GenerativeModel,
    csv_data: &str,
    column_mapping: &HashMap<String, String>,
) -> Result<ImportSummary, AppError> {
    let mapping = ColumnMapping::from_raw(column_mapping)?;
    let parsed = parse_csv(csv_data, &mapping)?;
    info!(
        "Parsed {} records (completeness {}%)",
        parsed.records_processed, parsed.completeness
    );

    let batch = build_profiles(&parsed.records, source, model).await;
    let profiles_with_dna = batch
        .profiles
        .iter()
        .filter(|p| p.cultural_dna.is_some())
        .count();

    let outcome = replace_profiles(pool, &batch.profiles).await?;

    Ok(ImportSummary {
        records_processed: parsed.records_processed,
        profiles_created: outcome.inserted,
        profiles_with_dna,
        enrichment_failures: batch.enrichment_failures,
        save_failures: outcome.failed,
        data_quality: parsed.completeness,
    })
}

/// Turns parsed rows into profiles, one row at a time.
pub async fn build_profiles(
    records: &[CanonicalRecord],
    source: &dyn CorrelationSource,
    model: &dyn GenerativeModel,
) -> EnrichedBatch {
    let mut batch = EnrichedBatch::default();

    for (index, record) in records.iter().enumerate() {
        if record.is_empty() {
            continue;
        }

        let mut profile = NewCustomerProfile {
            age_range: record.age_range.clone(),
            spending_level: record.spending_level.clone(),
            purchase_categories: record.purchase_categories.clone(),
            interaction_frequency: record.interaction_frequency.clone(),
            cultural_dna: None,
        };

        if !record.purchase_categories.is_empty() {
            match enrich_categories(&record.purchase_categories, source, model).await {
                Ok(dna) => profile.cultural_dna = Some(dna),
                Err(e) => {
                    warn!("DNA synthesis failed for row {index}; saving without DNA: {e}");
                    batch.enrichment_failures += 1;
                }
            }
        }

        batch.profiles.push(profile);
    }

    info!(
        "Built {} profiles from {} records ({} enrichment failures)",
        batch.profiles.len(),
        records.len(),
        batch.enrichment_failures
    );
    batch
}
