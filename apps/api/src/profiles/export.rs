//! Customer CSV export.
//!
//! Columns: customerId, assignedSegment, topAffinity1-3, interactionFrequency,
//! spendingLevel. Segment assignment is a deterministic word-overlap match
//! between a profile's affinities and each segment's name and characteristics.

use std::collections::HashSet;

use crate::models::customer::CustomerProfileRow;
use crate::models::segment::SegmentRow;

pub const UNASSIGNED: &str = "Unassigned";

const HEADER: &str =
    "customerId,assignedSegment,topAffinity1,topAffinity2,topAffinity3,interactionFrequency,spendingLevel";

/// Renders all profiles as CSV. `segments` must be in rank order; ties in
/// overlap go to the better-ranked segment.
pub fn render_customers_csv(profiles: &[CustomerProfileRow], segments: &[SegmentRow]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for profile in profiles {
        let top = profile
            .dna()
            .map(|dna| dna.top_categories(3))
            .unwrap_or_default();
        let affinity = |i: usize| top.get(i).copied().unwrap_or("");

        let row = [
            profile.id.to_string(),
            assign_segment(profile, segments).to_string(),
            affinity(0).to_string(),
            affinity(1).to_string(),
            affinity(2).to_string(),
            profile.interaction_frequency.clone().unwrap_or_default(),
            profile.spending_level.clone().unwrap_or_default(),
        ];
        let escaped: Vec<String> = row.iter().map(|f| escape_field(f)).collect();
        out.push_str(&escaped.join(","));
        out.push('\n');
    }
    out
}

/// Picks the segment sharing the most words with the profile's top affinities,
/// their preferences, and its purchase categories.
pub fn assign_segment<'a>(profile: &CustomerProfileRow, segments: &'a [SegmentRow]) -> &'a str {
    let profile_words = profile_vocabulary(profile);
    if profile_words.is_empty() {
        return UNASSIGNED;
    }

    let mut best: Option<(&SegmentRow, usize)> = None;
    for segment in segments {
        let mut segment_text = segment.name.clone();
        for c in &segment.characteristics {
            segment_text.push(' ');
            segment_text.push_str(c);
        }
        let overlap = words(&segment_text)
            .intersection(&profile_words)
            .count();
        // strict > keeps the better-ranked segment on ties
        if overlap > 0 && best.map_or(true, |(_, n)| overlap > n) {
            best = Some((segment, overlap));
        }
    }

    best.map(|(s, _)| s.name.as_str()).unwrap_or(UNASSIGNED)
}

fn profile_vocabulary(profile: &CustomerProfileRow) -> HashSet<String> {
    let mut text = profile.purchase_categories.join(" ");
    if let Some(dna) = profile.dna() {
        let top = dna.top_categories(3);
        for (name, affinity) in dna.categories() {
            if top.contains(&name) {
                text.push(' ');
                text.push_str(name);
                for pref in &affinity.preferences {
                    text.push(' ');
                    text.push_str(pref);
                }
            }
        }
    }
    words(&text)
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::customer::{CategoryAffinity, CulturalDna};
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn profile(categories: &[&str], dna: Option<CulturalDna>) -> CustomerProfileRow {
        CustomerProfileRow {
            id: Uuid::new_v4(),
            age_range: Some("25-34".to_string()),
            spending_level: Some("High".to_string()),
            purchase_categories: categories.iter().map(|s| s.to_string()).collect(),
            interaction_frequency: Some("weekly".to_string()),
            cultural_dna: dna.map(Json),
            accuracy_feedback: None,
            import_position: 0,
            created_at: Utc::now(),
        }
    }

    fn segment(name: &str, rank: i32, characteristics: &[&str]) -> SegmentRow {
        SegmentRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            size: 10,
            value_tier: "high".to_string(),
            characteristics: characteristics.iter().map(|s| s.to_string()).collect(),
            recommended_channels: vec![],
            messaging: String::new(),
            business_opportunity_rank: rank,
            bias_warning: None,
            actual_roi: None,
            created_at: Utc::now(),
        }
    }

    fn music_dna() -> CulturalDna {
        let mut dna = CulturalDna::placeholder("x", 60.0);
        dna.music = CategoryAffinity {
            score: 90.0,
            preferences: vec!["Jazz".to_string()],
        };
        dna.dining = CategoryAffinity {
            score: 70.0,
            preferences: vec!["Coffee".to_string()],
        };
        dna
    }

    #[test]
    fn test_csv_header_and_columns() {
        let p = profile(&["vinyl"], Some(music_dna()));
        let csv = render_customers_csv(&[p.clone()], &[]);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), HEADER);
        let row = lines.next().unwrap();
        assert_eq!(
            row,
            format!("{},Unassigned,music,dining,,weekly,High", p.id)
        );
    }

    #[test]
    fn test_profile_without_dna_has_blank_affinities() {
        let p = profile(&[], None);
        let csv = render_customers_csv(&[p.clone()], &[]);
        assert!(csv.contains(&format!("{},Unassigned,,,,weekly,High", p.id)));
    }

    #[test]
    fn test_assign_segment_by_overlap() {
        let p = profile(&["vinyl"], Some(music_dna()));
        let segments = vec![
            segment("Weekend Travelers", 1, &["travel", "hotels"]),
            segment("Jazz Café Regulars", 2, &["jazz", "coffee", "music"]),
        ];
        assert_eq!(assign_segment(&p, &segments), "Jazz Café Regulars");
    }

    #[test]
    fn test_assign_segment_tie_goes_to_better_rank() {
        let p = profile(&["books"], None);
        let segments = vec![
            segment("Readers A", 1, &["books"]),
            segment("Readers B", 2, &["books"]),
        ];
        assert_eq!(assign_segment(&p, &segments), "Readers A");
    }

    #[test]
    fn test_escape_field_quotes_commas() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("plain"), "plain");
    }
}
