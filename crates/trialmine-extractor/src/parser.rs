//! Parse free-text oracle answers

use crate::types::OutcomeItem;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use trialmine_domain::{normalize_answer, ChunkMapping, FieldName};

/// Strip a surrounding markdown code fence, if any
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    // Drop the opening fence line (with its optional language tag) and the closing fence
    let body = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => return "",
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Slice from the first `open` to the last `close`, inclusive
fn delimited(response: &str, open: char, close: char) -> Option<&str> {
    let start = response.find(open)?;
    let end = response.rfind(close)?;
    (end > start).then(|| &response[start..=end])
}

/// Normalize a label such as `**Primary Outcome Measures**` to a field name
fn label_to_field(label: &str) -> Option<FieldName> {
    let cleaned = label
        .trim()
        .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•' || c.is_whitespace())
        .trim_matches(|c: char| c == '*' || c == '`' || c == '"')
        .trim();
    FieldName::parse(cleaned).or_else(|| FieldName::parse(&cleaned.replace([' ', '-'], "_")))
}

/// Read `field_name: value` lines for the requested fields
///
/// Not-found spellings map to `None`. A single requested field also
/// accepts a bare, unlabeled answer.
pub fn parse_field_answers(
    response: &str,
    fields: &[FieldName],
) -> BTreeMap<FieldName, Option<String>> {
    let body = strip_code_fence(response);
    let mut answers = BTreeMap::new();

    for line in body.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let Some(field) = label_to_field(label) else {
            continue;
        };
        if !fields.contains(&field) || answers.contains_key(&field) {
            continue;
        }
        let value = value.trim().trim_matches('*').trim();
        answers.insert(field, normalize_answer(value));
    }

    if let [field] = fields {
        if !answers.contains_key(field) {
            debug!("No labeled line for {}, using the bare answer", field);
            answers.insert(*field, normalize_answer(body));
        }
    }

    answers
}

#[derive(Deserialize)]
struct RawMapping {
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    confidence: BTreeMap<String, f64>,
    #[serde(default)]
    sections: Vec<String>,
}

/// Parse a chunk-analysis answer
///
/// Unknown field names are dropped; a listed field without a score gets 0.5.
pub fn parse_chunk_mapping(
    chunk_id: usize,
    response: &str,
    targets: &[FieldName],
) -> Result<ChunkMapping, String> {
    let json = delimited(response, '{', '}').ok_or_else(|| "no JSON object in answer".to_string())?;
    let raw: RawMapping = serde_json::from_str(json).map_err(|e| e.to_string())?;

    let scores: BTreeMap<FieldName, f64> = raw
        .confidence
        .iter()
        .filter_map(|(name, score)| label_to_field(name).map(|f| (f, score.clamp(0.0, 1.0))))
        .collect();

    let identified_fields: BTreeSet<FieldName> = raw
        .fields
        .iter()
        .filter_map(|name| label_to_field(name))
        .filter(|f| targets.contains(f))
        .collect();

    let confidence_scores = identified_fields
        .iter()
        .map(|f| (*f, scores.get(f).copied().unwrap_or(0.5)))
        .collect();

    Ok(ChunkMapping {
        chunk_id,
        identified_fields,
        confidence_scores,
        relevant_sections: raw.sections,
    })
}

/// Parse a structured outcome answer
///
/// `Err` means the answer held no parseable JSON array, which triggers the
/// count-then-itemize fallback; an empty array is a valid "none".
pub fn parse_outcome_items(response: &str) -> Result<Vec<OutcomeItem>, String> {
    let json = delimited(response, '[', ']').ok_or_else(|| "no JSON array in answer".to_string())?;
    let items: Vec<OutcomeItem> = serde_json::from_str(json).map_err(|e| e.to_string())?;
    Ok(items
        .into_iter()
        .filter(|item| normalize_answer(&item.outcome_measure).is_some())
        .collect())
}

/// First integer in an answer
pub fn parse_count(response: &str) -> Option<usize> {
    let digits: String = response
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
