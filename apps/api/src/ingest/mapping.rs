//! Column mapper: maps arbitrary CSV headers onto the four canonical fields.
//!
//! Two strategies: a deterministic keyword heuristic, and a model-suggested
//! mapping that is validated and falls back to the heuristic on any failure.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ingest::csv::IngestError;
use crate::ingest::prompts::{COLUMN_MAPPING_PROMPT_TEMPLATE, COLUMN_MAPPING_SYSTEM};
use crate::llm_client::{request_json, GenerativeModel, LlmError, Validate};

/// Number of preview rows forwarded to the model.
const PREVIEW_ROWS: usize = 5;

/// One of the four standardized customer attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    AgeRange,
    SpendingLevel,
    PurchaseCategories,
    InteractionFrequency,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 4] = [
        CanonicalField::AgeRange,
        CanonicalField::SpendingLevel,
        CanonicalField::PurchaseCategories,
        CanonicalField::InteractionFrequency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::AgeRange => "age_range",
            CanonicalField::SpendingLevel => "spending_level",
            CanonicalField::PurchaseCategories => "purchase_categories",
            CanonicalField::InteractionFrequency => "interaction_frequency",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == value)
    }
}

/// Validated source-column → canonical-field mapping. Columns that are absent
/// or mapped to `""` are simply not present here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    targets: HashMap<String, CanonicalField>,
}

impl ColumnMapping {
    /// Validates a wire mapping. Every value must be a canonical field name or
    /// `""`, and at least one column must map somewhere.
    pub fn from_raw(raw: &HashMap<String, String>) -> Result<Self, IngestError> {
        let mut targets = HashMap::new();
        for (header, value) in raw {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let field = CanonicalField::parse(value).ok_or_else(|| IngestError::UnknownField {
                header: header.clone(),
                value: value.to_string(),
            })?;
            targets.insert(header.trim().to_string(), field);
        }
        if targets.is_empty() {
            return Err(IngestError::EmptyMapping);
        }
        Ok(Self { targets })
    }

    pub fn target(&self, header: &str) -> Option<CanonicalField> {
        self.targets.get(header).copied()
    }
}

/// Which strategy the caller wants for `suggest_mapping`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingStrategy {
    #[default]
    Ai,
    Heuristic,
}

// Checked in this order so that e.g. "engagement" and "average_spend" do not
// fall into age_range via the "age" substring.
const KEYWORDS: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::InteractionFrequency,
        &["freq", "interaction", "engagement", "visit", "activity", "recency", "last_"],
    ),
    (
        CanonicalField::SpendingLevel,
        &["spend", "income", "budget", "revenue", "value", "amount", "tier", "ltv"],
    ),
    (
        CanonicalField::PurchaseCategories,
        &["categor", "interest", "product", "purchase", "genre", "hobby", "prefer"],
    ),
    (CanonicalField::AgeRange, &["age", "birth", "dob"]),
];

/// Deterministic keyword mapping. Each canonical field is claimed by at most
/// one header (the first that matches); everything else maps to `""`.
pub fn heuristic_mapping(headers: &[String]) -> HashMap<String, String> {
    let mut claimed: HashSet<CanonicalField> = HashSet::new();
    headers
        .iter()
        .map(|header| {
            let lower = header.to_lowercase();
            let field = KEYWORDS
                .iter()
                .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
                .map(|(field, _)| *field)
                .filter(|field| claimed.insert(*field));
            (
                header.clone(),
                field.map(|f| f.as_str().to_string()).unwrap_or_default(),
            )
        })
        .collect()
}

/// Raw header → field mapping as returned by the model.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct ModelMapping(HashMap<String, String>);

impl ModelMapping {
    /// Keeps exactly one entry per requested header. Keys the model invented
    /// are discarded; headers it skipped map to `""`.
    fn project(mut self, headers: &[String]) -> Self {
        ModelMapping(
            headers
                .iter()
                .map(|h| (h.clone(), self.0.remove(h).unwrap_or_default()))
                .collect(),
        )
    }
}

impl Validate for ModelMapping {
    fn validate(self) -> Result<Self, String> {
        let mut claimed = HashSet::new();
        for (header, value) in &self.0 {
            if value.is_empty() {
                continue;
            }
            let field = CanonicalField::parse(value)
                .ok_or_else(|| format!("header '{header}' mapped to unknown field '{value}'"))?;
            if !claimed.insert(field) {
                return Err(format!("field '{value}' claimed by more than one header"));
            }
        }
        Ok(self)
    }
}

/// Suggests a mapping for `headers`. With `MappingStrategy::Ai` the model is
/// asked first; any model failure or invalid reply falls back to the heuristic.
/// The result always has exactly one entry per header.
pub async fn suggest_mapping(
    headers: &[String],
    preview: &[Vec<String>],
    strategy: MappingStrategy,
    model: &dyn GenerativeModel,
) -> HashMap<String, String> {
    if strategy == MappingStrategy::Heuristic {
        return heuristic_mapping(headers);
    }

    let prompt = match build_mapping_prompt(headers, preview) {
        Ok(p) => p,
        Err(e) => {
            warn!("Could not build column mapping prompt ({e}); using heuristic mapping");
            return heuristic_mapping(headers);
        }
    };

    let reply = request_json::<ModelMapping>(model, &prompt, COLUMN_MAPPING_SYSTEM)
        .await
        .and_then(|m| m.project(headers).validate().map_err(LlmError::Schema));

    match reply {
        Ok(ModelMapping(suggested)) => {
            info!("Model suggested a mapping for {} headers", headers.len());
            suggested
        }
        Err(e) => {
            warn!("Model column mapping rejected ({e}); using heuristic mapping");
            heuristic_mapping(headers)
        }
    }
}

fn build_mapping_prompt(
    headers: &[String],
    preview: &[Vec<String>],
) -> Result<String, serde_json::Error> {
    let headers_json = serde_json::to_string(headers)?;
    let sample: Vec<&Vec<String>> = preview.iter().take(PREVIEW_ROWS).collect();
    let preview_json = serde_json::to_string_pretty(&sample)?;
    Ok(COLUMN_MAPPING_PROMPT_TEMPLATE
        .replace("{headers_json}", &headers_json)
        .replace("{preview_json}", &preview_json))
}
