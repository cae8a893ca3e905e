// Per-customer enrichment: taste correlations in, Cultural DNA out.
// All model calls go through llm_client; no direct Anthropic calls here.

pub mod correlation;
pub mod prompts;
pub mod synthesizer;
