// Ingestion LLM prompt templates.

pub const COLUMN_MAPPING_SYSTEM: &str = "\
You are a data onboarding assistant for a marketing CRM. \
You map spreadsheet column headers to a fixed set of customer fields. \
You MUST respond with valid JSON only, with no markdown fences, no explanations.";

/// Replace: {headers_json}, {preview_json}
pub const COLUMN_MAPPING_PROMPT_TEMPLATE: &str = r#"Map each CSV column header below to one of the canonical customer fields.

CANONICAL FIELDS:
- "age_range": the customer's age, age bracket, or birth date
- "spending_level": spend amount, spend tier, income, or customer value
- "purchase_categories": product categories, interests, or things purchased
- "interaction_frequency": how often the customer visits, buys, or engages

HEADERS:
{headers_json}

SAMPLE ROWS (first rows of the file, in header order):
{preview_json}

Return a JSON object whose keys are the headers EXACTLY as given and whose values are
one of "age_range", "spending_level", "purchase_categories", "interaction_frequency", or "" (empty string) when the column fits none of them.

RULES:
1. Each canonical field may be claimed by AT MOST ONE header.
2. If several headers could fit the same field, pick the single best fit and map the others to "".
3. Use the sample rows to judge what a column really contains, not only its name.
4. Return ONLY the JSON object."#;
