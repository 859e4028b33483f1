//! Token helpers shared by the tier rules

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bNCT[\s-]?(\d{8})\b").expect("static pattern"));

static CANONICAL_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^NCT\d{8}$").expect("static pattern"));

static PHASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(early\s*[_-]?\s*)?phase\s*[_-]?\s*(iv|iii|ii|i|[0-4])\b(?:\s*/\s*(?:phase\s*)?(iv|iii|ii|i|[0-4])\b)?")
        .expect("static pattern")
});

const STOPWORDS: &[&str] = &[
    "about", "after", "also", "among", "and", "are", "before", "being", "between", "both",
    "during", "each", "from", "have", "into", "more", "most", "only", "other", "over", "such",
    "than", "that", "their", "them", "then", "there", "these", "they", "this", "those", "through",
    "under", "until", "upon", "were", "what", "when", "where", "which", "while", "will", "with",
    "within", "without", "would",
];

/// Labels that may precede a list component without being part of it
const COMPONENT_LABELS: &[&str] = &[
    "drug",
    "device",
    "procedure",
    "behavioral",
    "biological",
    "radiation",
    "dietary supplement",
    "genetic",
    "diagnostic test",
    "combination product",
    "other",
    "treatment",
];

/// Salient terms of a synthesized value, at most `max` of them
///
/// A term is longer than three characters, not a stopword, and either
/// capitalized or carrying a digit, slash or hyphen.
pub fn key_terms(value: &str, max: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut terms = Vec::new();

    for raw in value.split_whitespace() {
        let token = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '/' && c != '-');
        let token = token.trim_matches('-');
        if token.chars().count() <= 3 {
            continue;
        }
        let lowered = token.to_lowercase();
        if STOPWORDS.contains(&lowered.as_str()) {
            continue;
        }
        let salient = token.chars().next().is_some_and(|c| c.is_uppercase())
            || token.chars().any(|c| c.is_ascii_digit() || c == '/' || c == '-');
        if salient && seen.insert(lowered) {
            terms.push(token.to_string());
            if terms.len() >= max {
                break;
            }
        }
    }

    terms
}

/// Every trial identifier printed in `text`, in canonical `NCT########` form
pub fn identifiers_in(text: &str) -> BTreeSet<String> {
    IDENTIFIER
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|digits| format!("NCT{}", digits.as_str()))
        .collect()
}

/// Canonical form of an identifier answer, or `None` if it is malformed
pub(crate) fn canonical_identifier(value: &str) -> Option<String> {
    let compact: String = value
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase();
    CANONICAL_IDENTIFIER
        .is_match(&compact)
        .then_some(compact)
}

/// Trial phases mentioned in `text`, as `1`..`4` or `early1`
///
/// "Phase 2", "PHASE2" and "Phase II" all give `2`; "Phase 1/2" gives both.
pub fn phases_in(text: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for caps in PHASE.captures_iter(text) {
        let early = caps.get(1).is_some();
        if let Some(first) = caps.get(2).and_then(|m| phase_number(m.as_str())) {
            found.insert(if early { format!("early{}", first) } else { first.to_string() });
        }
        if let Some(second) = caps.get(3).and_then(|m| phase_number(m.as_str())) {
            found.insert(second.to_string());
        }
    }
    found
}

fn phase_number(token: &str) -> Option<&'static str> {
    match token.to_lowercase().as_str() {
        "i" | "1" => Some("1"),
        "ii" | "2" => Some("2"),
        "iii" | "3" => Some("3"),
        "iv" | "4" => Some("4"),
        "0" => Some("0"),
        _ => None,
    }
}

/// Drop a leading type label such as `Drug:` from a list component
pub(crate) fn strip_label(component: &str) -> &str {
    let trimmed = component.trim();
    if let Some((label, rest)) = trimmed.split_once(':') {
        let label = label.trim().to_lowercase();
        if COMPONENT_LABELS.contains(&label.as_str()) && !rest.trim().is_empty() {
            return rest.trim();
        }
    }
    trimmed
}

/// Lower-case `text` and replace every punctuation character with a space
pub(crate) fn squash_punctuation(text: &str) -> String {
    let spaced: String = text
        .chars()
        .map(|c| if c.is_ascii_punctuation() { ' ' } else { c })
        .collect();
    spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
