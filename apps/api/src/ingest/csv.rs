//! CSV ingestion: turns a raw delimited text blob into canonical customer records.
//!
//! The format is deliberately simple: lines split on newline, fields split on
//! comma, one pair of surrounding quotes stripped. Rows whose field count does
//! not match the header are dropped; nothing else is.

use serde::Serialize;
use thiserror::Error;

use crate::ingest::mapping::{CanonicalField, ColumnMapping};

#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("No valid records found in CSV data")]
    NoRecords,

    #[error("Column mapping does not map any column to a customer field")]
    EmptyMapping,

    #[error("Column '{header}' is mapped to unknown field '{value}'")]
    UnknownField { header: String, value: String },
}

/// One row reduced to the four canonical fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    pub age_range: Option<String>,
    pub spending_level: Option<String>,
    pub purchase_categories: Vec<String>,
    pub interaction_frequency: Option<String>,
}

impl CanonicalRecord {
    /// Number of canonical fields carrying a value (0–4).
    pub fn filled_fields(&self) -> usize {
        [
            self.age_range.is_some(),
            self.spending_level.is_some(),
            !self.purchase_categories.is_empty(),
            self.interaction_frequency.is_some(),
        ]
        .iter()
        .filter(|filled| **filled)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.filled_fields() == 0
    }
}

/// Output of a parse: how many rows survived, the rows, and a 0–100 quality score.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCsv {
    pub records_processed: usize,
    pub records: Vec<CanonicalRecord>,
    pub completeness: f64,
}

/// Parses `text` using `mapping` (source column → canonical field).
pub fn parse_csv(text: &str, mapping: &ColumnMapping) -> Result<ParsedCsv, IngestError> {
    // Spreadsheet exports often lead with a UTF-8 byte-order mark.
    let text = text.trim_start_matches('\u{feff}');
    let lines: Vec<&str> = text.trim().lines().collect();
    if lines.len() < 2 {
        return Err(IngestError::NoRecords);
    }

    let headers = split_line(lines[0]);
    let targets: Vec<Option<CanonicalField>> =
        headers.iter().map(|h| mapping.target(h)).collect();

    let records: Vec<CanonicalRecord> = lines[1..]
        .iter()
        .map(|line| split_line(line))
        .filter(|fields| fields.len() == headers.len())
        .map(|fields| build_record(&fields, &targets))
        .collect();

    Ok(ParsedCsv {
        records_processed: records.len(),
        completeness: completeness(&records),
        records,
    })
}

/// Filled canonical slots over `4 × records`, as a whole percentage.
pub fn completeness(records: &[CanonicalRecord]) -> f64 {
    let slots = (records.len() * CanonicalField::ALL.len()) as f64;
    let filled: usize = records.iter().map(CanonicalRecord::filled_fields).sum();
    let pct = filled as f64 / slots * 100.0;
    if pct.is_nan() {
        0.0
    } else {
        pct.round().clamp(0.0, 100.0)
    }
}

/// Splits `purchase_categories` text on `;`, `,` or `|`, dropping blanks.
pub fn split_categories(raw: &str) -> Vec<String> {
    raw.split([';', ',', '|'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn split_line(line: &str) -> Vec<String> {
    line.split(',').map(clean_field).collect()
}

fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

fn build_record(fields: &[String], targets: &[Option<CanonicalField>]) -> CanonicalRecord {
    // many-to-one mappings: first non-empty value in header order wins
    let value_for = |field: CanonicalField| -> Option<String> {
        fields
            .iter()
            .zip(targets)
            .filter(|(_, target)| **target == Some(field))
            .map(|(value, _)| value)
            .find(|value| !value.is_empty())
            .cloned()
    };

    CanonicalRecord {
        age_range: value_for(CanonicalField::AgeRange),
        spending_level: value_for(CanonicalField::SpendingLevel),
        purchase_categories: value_for(CanonicalField::PurchaseCategories)
            .map(|raw| split_categories(&raw))
            .unwrap_or_default(),
        interaction_frequency: value_for(CanonicalField::InteractionFrequency),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn mapping(pairs: &[(&str, &str)]) -> ColumnMapping {
        let raw: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ColumnMapping::from_raw(&raw).unwrap()
    }

    fn full_mapping() -> ColumnMapping {
        mapping(&[
            ("age", "age_range"),
            ("spend", "spending_level"),
            ("cats", "purchase_categories"),
            ("freq", "interaction_frequency"),
        ])
    }

    #[test]
    fn test_records_processed_equals_data_rows() {
        let csv = "age,spend,cats,freq\n\
                   18-24,Low,books,weekly\n\
                   25-34,High,wine;travel,daily\n\
                   35-44,Medium,vinyl,monthly";
        let parsed = parse_csv(csv, &full_mapping()).unwrap();
        assert_eq!(parsed.records_processed, 3);
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.completeness, 100.0);
    }

    #[test]
    fn test_mismatched_rows_are_excluded() {
        let csv = "age,spend,cats,freq\n\
                   18-24,Low,books,weekly\n\
                   25-34,High\n\
                   35-44,Medium,vinyl,monthly,extra";
        let parsed = parse_csv(csv, &full_mapping()).unwrap();
        assert_eq!(parsed.records_processed, 1);
        assert_eq!(parsed.records[0].age_range.as_deref(), Some("18-24"));
    }

    #[test]
    fn test_blank_row_with_matching_width_is_kept() {
        let csv = "age,spend\n30-40,High\n,\n";
        let parsed = parse_csv(csv, &mapping(&[("age", "age_range"), ("spend", "spending_level")]))
            .unwrap();
        assert_eq!(parsed.records_processed, 2);
        assert!(parsed.records[1].is_empty());
        // 2 filled slots out of 2 rows x 4 fields
        assert_eq!(parsed.completeness, 25.0);
    }

    #[test]
    fn test_leading_byte_order_mark_is_ignored() {
        let csv = "\u{feff}age,spend\n30-40,High";
        let parsed = parse_csv(csv, &mapping(&[("age", "age_range"), ("spend", "spending_level")]))
            .unwrap();
        assert_eq!(parsed.records_processed, 1);
        assert_eq!(parsed.records[0].age_range.as_deref(), Some("30-40"));
        assert_eq!(parsed.records[0].spending_level.as_deref(), Some("High"));
    }

    #[test]
    fn test_fewer_than_two_lines_is_error() {
        assert_eq!(
            parse_csv("age,spend", &full_mapping()).unwrap_err(),
            IngestError::NoRecords
        );
        assert_eq!(
            parse_csv("  \n ", &full_mapping()).unwrap_err(),
            IngestError::NoRecords
        );
    }

    #[test]
    fn test_unmapped_header_is_discarded() {
        let csv = "age,email,cats\n25-34,a@b.com,books";
        let parsed = parse_csv(csv, &mapping(&[("age", "age_range"), ("cats", "purchase_categories")]))
            .unwrap();
        let record = &parsed.records[0];
        let json = serde_json::to_string(record).unwrap();
        assert!(!json.contains("a@b.com"));
        assert_eq!(record.purchase_categories, vec!["books".to_string()]);
    }

    #[test]
    fn test_header_mapped_to_empty_string_is_discarded() {
        let csv = "age,notes\n25-34,vip";
        let parsed = parse_csv(csv, &mapping(&[("age", "age_range"), ("notes", "")])).unwrap();
        assert_eq!(parsed.records[0].filled_fields(), 1);
    }

    #[test]
    fn test_quotes_are_stripped() {
        let csv = "\"age\",\"cats\"\n\"25-34\",\"books|film\"";
        let parsed = parse_csv(csv, &mapping(&[("age", "age_range"), ("cats", "purchase_categories")]))
            .unwrap();
        assert_eq!(parsed.records[0].age_range.as_deref(), Some("25-34"));
        assert_eq!(
            parsed.records[0].purchase_categories,
            vec!["books".to_string(), "film".to_string()]
        );
    }

    #[test]
    fn test_many_to_one_mapping_takes_first_non_empty() {
        let csv = "age_a,age_b\n,45-54\n18-24,65+";
        let parsed = parse_csv(csv, &mapping(&[("age_a", "age_range"), ("age_b", "age_range")]))
            .unwrap();
        assert_eq!(parsed.records[0].age_range.as_deref(), Some("45-54"));
        assert_eq!(parsed.records[1].age_range.as_deref(), Some("18-24"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let csv = "age,spend\r\n25-34,High\r\n";
        let parsed = parse_csv(csv, &mapping(&[("age", "age_range"), ("spend", "spending_level")]))
            .unwrap();
        assert_eq!(parsed.records_processed, 1);
        assert_eq!(parsed.records[0].spending_level.as_deref(), Some("High"));
    }

    #[test]
    fn test_split_categories_all_delimiters() {
        assert_eq!(
            split_categories("books; wine | film,, ;"),
            vec!["books".to_string(), "wine".to_string(), "film".to_string()]
        );
        assert!(split_categories(" ; | ").is_empty());
    }

    #[test]
    fn test_completeness_empty_is_zero_not_nan() {
        assert_eq!(completeness(&[]), 0.0);
    }

    #[test]
    fn test_completeness_header_only_after_filtering() {
        // trailing row has the wrong width, so nothing survives
        let parsed = parse_csv("age,spend\n25-34", &full_mapping()).unwrap();
        assert_eq!(parsed.records_processed, 0);
        assert_eq!(parsed.completeness, 0.0);
    }
}
