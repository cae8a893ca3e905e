// Enrichment LLM prompt templates.

pub const DNA_SYSTEM: &str = "\
You are a cultural-insights analyst who builds taste profiles for marketing teams. \
You turn taste-graph correlation data into a structured affinity profile. \
You MUST respond with valid JSON only, with no markdown fences, no explanations. \
Never invent preferences that are not supported by the correlation data.";

/// Replace: {categories_json}, {correlations_json}
pub const DNA_PROMPT_TEMPLATE: &str = r#"Build a Cultural DNA profile for one customer.

PURCHASE CATEGORIES (what the customer actually bought, in order):
{categories_json}

TASTE-GRAPH CORRELATIONS (category, entity name, correlationScore 0-1):
{correlations_json}

OUTPUT SCHEMA (return exactly this structure):
{
  "music":         {"score": 0-100, "preferences": ["string"]},
  "entertainment": {"score": 0-100, "preferences": ["string"]},
  "dining":        {"score": 0-100, "preferences": ["string"]},
  "fashion":       {"score": 0-100, "preferences": ["string"]},
  "travel":        {"score": 0-100, "preferences": ["string"]},
  "lifestyle":     {"score": 0-100, "preferences": ["string"]},
  "surpriseConnections": ["string"],
  "confidenceScore": 0-100
}

RULES:
1. score reflects how strongly the correlations point at that category; use 0 when there is no signal
2. preferences are concrete entities taken from the correlation names, at most 5 per category
3. surpriseConnections are 1-3 non-obvious links between the purchases and the correlations
4. confidenceScore reflects how much correlation data supported the profile
5. Return ONLY the JSON object."#;
