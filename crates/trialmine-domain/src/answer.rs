//! Normalization of free-text oracle answers
//!
//! Every call site that needs to know whether the oracle "found" something
//! goes through [`normalize_answer`].

/// Answers that mean "the field is not in this text"
pub const NOT_FOUND_SYNONYMS: &[&str] = &[
    "not_found",
    "not found",
    "notfound",
    "none",
    "n/a",
    "null",
    "unknown",
    "not available",
    "not specified",
    "not stated",
    "not mentioned",
    "not provided",
];

/// Check whether an answer means "not found"
pub fn is_not_found(answer: &str) -> bool {
    let trimmed = answer
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
        .trim();
    if trimmed.is_empty() {
        return true;
    }
    let lowered = trimmed.to_lowercase();
    NOT_FOUND_SYNONYMS.contains(&lowered.as_str())
}

/// Trim an answer and map every not-found spelling to `None`
pub fn normalize_answer(answer: &str) -> Option<String> {
    if is_not_found(answer) {
        return None;
    }
    let trimmed = answer.trim().trim_matches('"').trim();
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonyms() {
        for s in ["NOT_FOUND", "NOT FOUND", "None", "N/A", "", "   ", "\"NOT_FOUND\"", "Not found."] {
            assert!(is_not_found(s), "{:?} should be not-found", s);
            assert_eq!(normalize_answer(s), None);
        }
    }

    #[test]
    fn test_real_values_pass_through() {
        assert_eq!(normalize_answer("  Acme Corp "), Some("Acme Corp".to_string()));
        assert_eq!(normalize_answer("\"PHASE2\""), Some("PHASE2".to_string()));
        assert!(!is_not_found("Nonet Pharmaceuticals"));
    }

    #[test]
    fn test_registry_na_is_a_value() {
        // Registry spelling for "phase not applicable"
        assert!(!is_not_found("NA"));
        assert_eq!(normalize_answer(" NA "), Some("NA".to_string()));
        assert!(is_not_found("n/a"));
    }
}
