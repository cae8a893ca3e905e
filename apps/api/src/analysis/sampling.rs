//! Profile down-sampling and the summarized corpus view sent to the model.
//!
//! Sampling is plain truncation: the first `cap` profiles in import order.
//! Early imports are over-represented in large corpora.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::customer::CustomerProfileRow;
use crate::models::settings::SettingsRow;

pub const SEGMENT_SAMPLE_CAP: usize = 100;
pub const INSIGHT_SAMPLE_CAP: usize = 50;
pub const CALENDAR_SAMPLE_CAP: usize = 50;

/// Preferences per category carried into a profile summary.
const PREFERENCES_PER_CATEGORY: usize = 3;

/// First `cap` profiles.
pub fn sample_profiles(profiles: &[CustomerProfileRow], cap: usize) -> &[CustomerProfileRow] {
    &profiles[..profiles.len().min(cap)]
}

/// Compact per-profile view. Ids and timestamps are left out of prompts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spending_level: Option<String>,
    pub purchase_categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_frequency: Option<String>,
    pub top_affinities: Vec<String>,
    pub preferences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_feedback: Option<i16>,
}

pub fn summarize(profile: &CustomerProfileRow) -> ProfileSummary {
    let (top_affinities, preferences, confidence_score) = match profile.dna() {
        Some(dna) => {
            let top = dna.top_categories(3);
            let preferences = dna
                .categories()
                .iter()
                .filter(|(name, _)| top.contains(name))
                .flat_map(|(_, a)| a.preferences.iter().take(PREFERENCES_PER_CATEGORY).cloned())
                .collect();
            (
                top.into_iter().map(String::from).collect(),
                preferences,
                Some(dna.confidence_score),
            )
        }
        None => (vec![], vec![], None),
    };

    ProfileSummary {
        age_range: profile.age_range.clone(),
        spending_level: profile.spending_level.clone(),
        purchase_categories: profile.purchase_categories.clone(),
        interaction_frequency: profile.interaction_frequency.clone(),
        top_affinities,
        preferences,
        confidence_score,
        accuracy_feedback: profile.accuracy_feedback.filter(|f| *f != 0),
    }
}

/// Aggregate counts over the whole corpus, not just the sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusOverview {
    pub total_profiles: usize,
    pub sampled_profiles: usize,
    pub profiles_with_dna: usize,
    pub spending_levels: BTreeMap<String, usize>,
    pub interaction_frequencies: BTreeMap<String, usize>,
    pub top_purchase_categories: Vec<CategoryCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

pub fn overview(profiles: &[CustomerProfileRow], sampled: usize) -> CorpusOverview {
    let mut spending_levels = BTreeMap::new();
    let mut interaction_frequencies = BTreeMap::new();
    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    let mut confidences = Vec::new();

    for p in profiles {
        if let Some(level) = &p.spending_level {
            *spending_levels.entry(level.clone()).or_insert(0) += 1;
        }
        if let Some(freq) = &p.interaction_frequency {
            *interaction_frequencies.entry(freq.clone()).or_insert(0) += 1;
        }
        for c in &p.purchase_categories {
            *categories.entry(c.to_lowercase()).or_insert(0) += 1;
        }
        if let Some(dna) = p.dna() {
            confidences.push(dna.confidence_score);
        }
    }

    let mut top_purchase_categories: Vec<CategoryCount> = categories
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    // BTreeMap order breaks count ties alphabetically
    top_purchase_categories.sort_by(|a, b| b.count.cmp(&a.count));
    top_purchase_categories.truncate(10);

    let average_confidence = if confidences.is_empty() {
        None
    } else {
        let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
        Some((mean * 10.0).round() / 10.0)
    };

    CorpusOverview {
        total_profiles: profiles.len(),
        sampled_profiles: sampled,
        profiles_with_dna: confidences.len(),
        spending_levels,
        interaction_frequencies,
        top_purchase_categories,
        average_confidence,
    }
}

/// Business baseline block for analyzer prompts. Empty when nothing is set.
pub fn settings_context(settings: Option<&SettingsRow>) -> String {
    let Some(s) = settings else {
        return String::new();
    };

    let mut lines = Vec::new();
    if let Some(v) = s.average_order_value {
        lines.push(format!("- Average order value: {v:.2} {}", s.currency));
    }
    if let Some(v) = s.customer_lifetime_value {
        lines.push(format!("- Customer lifetime value: {v:.2} {}", s.currency));
    }
    if let Some(v) = s.monthly_marketing_budget {
        lines.push(format!("- Monthly marketing budget: {v:.2} {}", s.currency));
    }
    if let Some(v) = s.conversion_rate {
        lines.push(format!("- Conversion rate: {v}%"));
    }

    if lines.is_empty() {
        String::new()
    } else {
        format!("BUSINESS BASELINE:\n{}\n", lines.join("\n"))
    }
}
