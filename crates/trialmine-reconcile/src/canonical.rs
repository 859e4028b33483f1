//! Deterministic canonical forms for common benign variation

use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use trialmine_domain::FieldName;

static PHASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(early\s*[_-]?\s*)?phase\s*[_-]?\s*(iv|iii|ii|i|[0-4])\b(?:\s*/\s*(?:phase\s*)?(iv|iii|ii|i|[0-4])\b)?")
        .expect("static pattern")
});

static COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("static pattern"));

/// Lower-case and collapse whitespace
pub(crate) fn simple(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn phase_number(token: &str) -> &'static str {
    match token.to_lowercase().as_str() {
        "i" | "1" => "1",
        "ii" | "2" => "2",
        "iii" | "3" => "3",
        "iv" | "4" => "4",
        _ => "0",
    }
}

/// Set of phases mentioned, e.g. "Phase I/II" -> {1, 2}
pub(crate) fn phases(value: &str) -> Option<BTreeSet<String>> {
    let lowered = value.trim().to_lowercase();
    if matches!(lowered.as_str(), "na" | "n/a" | "not applicable") {
        return Some(BTreeSet::from(["na".to_string()]));
    }

    let mut found = BTreeSet::new();
    for caps in PHASE.captures_iter(value) {
        let early = caps.get(1).is_some();
        if let Some(first) = caps.get(2) {
            let number = phase_number(first.as_str());
            found.insert(if early { format!("early{}", number) } else { number.to_string() });
        }
        if let Some(second) = caps.get(3) {
            found.insert(phase_number(second.as_str()).to_string());
        }
    }
    (!found.is_empty()).then_some(found)
}

/// First integer in the value, ignoring thousands separators
pub(crate) fn count(value: &str) -> Option<u64> {
    COUNT
        .find(value)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// Calendar date with optional day
pub(crate) fn date(value: &str) -> Option<(i32, u32, Option<u32>)> {
    use chrono::Datelike;

    let v = value.trim().trim_end_matches('.');
    for fmt in ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(v, fmt) {
            return Some((d.year(), d.month(), Some(d.day())));
        }
    }
    // Month precision: parse against a synthetic first day
    for fmt in ["%Y-%m-%d", "%B %d %Y", "%b %d %Y"] {
        let candidate = match fmt {
            "%Y-%m-%d" => format!("{}-01", v),
            _ => {
                let mut parts = v.splitn(2, ' ');
                match (parts.next(), parts.next()) {
                    (Some(month), Some(year)) => format!("{} 01 {}", month, year.trim()),
                    _ => continue,
                }
            }
        };
        if let Ok(d) = NaiveDate::parse_from_str(&candidate, fmt) {
            return Some((d.year(), d.month(), None));
        }
    }
    None
}

/// Order-insensitive set of list components, labels and punctuation removed
pub(crate) fn list(value: &str) -> BTreeSet<String> {
    value
        .split(';')
        .map(|c| {
            let c = c.trim();
            let c = match c.split_once(':') {
                Some((label, rest)) if label.len() <= 20 && !rest.trim().is_empty() => rest,
                _ => c,
            };
            c.chars()
                .map(|ch| if ch.is_ascii_punctuation() { ' ' } else { ch })
                .collect::<String>()
        })
        .map(|c| simple(&c))
        .filter(|c| !c.is_empty())
        .collect()
}

/// If the values agree after field-specific canonicalization, say how
pub(crate) fn equivalent(field: FieldName, a: &str, b: &str) -> Option<&'static str> {
    match field {
        FieldName::Phases => {
            let (pa, pb) = (phases(a)?, phases(b)?);
            (pa == pb).then_some("same phases after normalizing notation")
        }
        FieldName::Enrollment => {
            let (ca, cb) = (count(a)?, count(b)?);
            (ca == cb).then_some("same participant count")
        }
        FieldName::StartDate
        | FieldName::PrimaryCompletionDate
        | FieldName::CompletionDate
        | FieldName::FirstPosted
        | FieldName::ResultsFirstPosted
        | FieldName::LastUpdatePosted => {
            let ((ya, ma, da), (yb, mb, db)) = (date(a)?, date(b)?);
            let days_agree = match (da, db) {
                (Some(x), Some(y)) => x == y,
                _ => true,
            };
            (ya == yb && ma == mb && days_agree).then_some("same date at common precision")
        }
        f if f.is_multi_value() => {
            let (la, lb) = (list(a), list(b));
            (!la.is_empty() && la == lb).then_some("same items in different order or format")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_notation() {
        assert_eq!(phases("Phase 2"), phases("PHASE2"));
        assert_eq!(phases("Phase II"), phases("phase 2"));
        assert_eq!(
            phases("Phase 1/Phase 2"),
            Some(BTreeSet::from(["1".to_string(), "2".to_string()]))
        );
        assert_eq!(phases("PHASE1, PHASE2"), phases("Phase I/II"));
        assert_ne!(phases("Early Phase 1"), phases("Phase 1"));
        assert!(phases("randomized").is_none());
    }

    #[test]
    fn test_count() {
        assert_eq!(count("1,200 participants"), Some(1200));
        assert_eq!(count("Approximately 120"), Some(120));
        assert_eq!(count("unknown"), None);
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(date("2020-03-15"), Some((2020, 3, Some(15))));
        assert_eq!(date("March 15, 2020"), Some((2020, 3, Some(15))));
        assert_eq!(date("2020-03"), Some((2020, 3, None)));
        assert_eq!(date("March 2020"), Some((2020, 3, None)));
        assert_eq!(date("soon"), None);
    }

    #[test]
    fn test_list_ignores_order_and_labels() {
        assert_eq!(list("DRUG: Aspirin; Placebo"), list("placebo;Drug: aspirin"));
    }

    #[test]
    fn test_equivalent() {
        assert!(equivalent(FieldName::Phases, "Phase 2", "PHASE2").is_some());
        assert!(equivalent(FieldName::Enrollment, "120", "120 participants").is_some());
        assert!(equivalent(FieldName::StartDate, "2020-03", "March 15, 2020").is_some());
        assert!(equivalent(FieldName::Conditions, "Asthma; COPD", "COPD; asthma").is_some());
        assert!(equivalent(FieldName::Phases, "Phase 2", "Phase 3").is_none());
        assert!(equivalent(FieldName::Sponsor, "Acme", "Acme Inc").is_none());
    }
}
