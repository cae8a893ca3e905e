// Aggregate analysis LLM prompt templates.
// Every template ends with EVIDENCE_INSTRUCTION appended by the caller.

pub const SEGMENTS_ROLE: &str = "\
You are a senior marketing strategist who segments customer bases using \
behavioral data and cultural taste profiles.";

/// Replace: {overview_json}, {profiles_json}, {settings_context}
pub const SEGMENTS_PROMPT_TEMPLATE: &str = r#"Group the customers below into marketing segments.

CORPUS OVERVIEW (counts over ALL customers):
{overview_json}

CUSTOMER SAMPLE:
{profiles_json}

{settings_context}
OUTPUT SCHEMA (return exactly this structure):
{
  "segments": [
    {
      "name": "string, unique",
      "size": integer estimated customer count,
      "valueTier": "high" | "medium" | "low",
      "characteristics": ["string", at most 5],
      "recommendedChannels": ["string"],
      "messaging": "string",
      "businessOpportunityRank": integer,
      "biasWarning": "string or null"
    }
  ],
  "campaignIdeas": [
    {"segmentName": "string", "title": "string", "description": "string", "channel": "string"}
  ]
}

RULES:
1. Produce 3-6 segments.
2. businessOpportunityRank runs 1..N with no gaps or repeats; 1 is the biggest opportunity.
3. Set biasWarning when the sample over-represents a group or the data is thin.
4. Every campaignIdea must name one of your segments exactly.
5. Return ONLY the JSON object."#;

pub const INSIGHTS_ROLE: &str = "\
You are a consumer-trends analyst who writes concise reports for marketing teams.";

/// Replace: {overview_json}, {profiles_json}, {settings_context}
pub const INSIGHTS_PROMPT_TEMPLATE: &str = r#"Identify the cultural and behavioral trends in this customer base.

CORPUS OVERVIEW (counts over ALL customers):
{overview_json}

CUSTOMER SAMPLE:
{profiles_json}

{settings_context}
OUTPUT SCHEMA:
{
  "title": "string",
  "summary": "string, 2-4 sentences",
  "trends": [{"name": "string", "description": "string", "evidence": "string"}],
  "recommendations": ["string"]
}

RULES:
1. 3-5 trends, each with evidence drawn from the data above.
2. 2-5 concrete recommendations.
3. Return ONLY the JSON object."#;

pub const CALENDAR_ROLE: &str = "\
You are a content marketing planner who schedules campaigns across customer segments.";

/// Replace: {segments_json}, {overview_json}, {profiles_json}, {settings_context}
pub const CALENDAR_PROMPT_TEMPLATE: &str = r#"Plan a 4-week content calendar covering the segments below.

SEGMENTS (in opportunity order):
{segments_json}

CORPUS OVERVIEW:
{overview_json}

CUSTOMER SAMPLE:
{profiles_json}

{settings_context}
OUTPUT SCHEMA:
{
  "weeks": [
    {
      "week": 1,
      "theme": "string",
      "entries": [
        {"day": "string", "segmentName": "string", "channel": "string", "contentIdea": "string"}
      ]
    }
  ]
}

RULES:
1. Exactly 4 weeks numbered 1-4.
2. segmentName must be one of the segment names above, exactly.
3. Higher-opportunity segments get more entries.
4. Return ONLY the JSON object."#;

pub const BRIEF_ROLE: &str = "\
You are a campaign director who writes one-page campaign briefs.";

/// Replace: {segment_json}, {overview_json}, {profiles_json}, {settings_context}
pub const BRIEF_PROMPT_TEMPLATE: &str = r#"Write a campaign brief for this customer segment.

SEGMENT:
{segment_json}

CORPUS OVERVIEW (counts over ALL customers):
{overview_json}

CUSTOMER SAMPLE:
{profiles_json}

{settings_context}
OUTPUT SCHEMA:
{
  "headline": "string",
  "objective": "string",
  "keyMessages": ["string"],
  "channels": ["string"],
  "callToAction": "string",
  "successMetrics": ["string"]
}

RULES:
1. Build on the segment's characteristics and messaging; do not contradict them.
2. Return ONLY the JSON object."#;

pub const SCRIPT_ROLE: &str = "\
You are a sales enablement coach who writes conversational sales scripts.";

/// Replace: {segment_json}, {overview_json}, {profiles_json}, {settings_context}
pub const SCRIPT_PROMPT_TEMPLATE: &str = r#"Write a sales script for reaching customers in this segment.

SEGMENT:
{segment_json}

CORPUS OVERVIEW (counts over ALL customers):
{overview_json}

CUSTOMER SAMPLE:
{profiles_json}

{settings_context}
OUTPUT SCHEMA:
{
  "opening": "string",
  "discoveryQuestions": ["string"],
  "valuePropositions": ["string"],
  "objectionHandling": [{"objection": "string", "response": "string"}],
  "closing": "string"
}

RULES:
1. Speak to the segment's cultural interests, not generic benefits.
2. Return ONLY the JSON object."#;
