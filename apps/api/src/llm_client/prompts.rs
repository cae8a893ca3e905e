// Shared prompt fragments.
// Each flow that needs LLM calls defines its own prompts.rs alongside it;
// this file holds the cross-cutting pieces.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every aggregate-analysis prompt.
pub const EVIDENCE_INSTRUCTION: &str = "\
    CRITICAL: Base every statement on the customer data provided. \
    Do NOT invent customers, counts, or preferences that are not present. \
    If the data is too thin to support a conclusion, say so explicitly.";

/// Builds a system prompt from a role description plus the JSON-only rules.
pub fn json_system(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}
