//! Ordered extraction strategies per field category
//!
//! A field is tried with each strategy of its chain in turn until one yields
//! a value the validator accepts. Whatever happened along the way decides
//! how the field fails when the chain runs out.

use trialmine_domain::{FailureKind, FieldName};

/// One way of obtaining a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Ask about the chunk the extraction plan nominated
    PlannedChunk,
    /// Ask about the whole document, truncated to the field budget
    FullDocument,
    /// One structured JSON query over the large outcome budget
    StructuredOutcomes,
    /// Ask how many outcomes exist, then for each one by number
    CountThenItemize,
}

const GENERIC_CHAIN: &[Strategy] = &[Strategy::PlannedChunk, Strategy::FullDocument];
const OUTCOME_CHAIN: &[Strategy] = &[Strategy::StructuredOutcomes, Strategy::CountThenItemize];

impl Strategy {
    /// Strategies to try for `field`, in order
    pub fn chain_for(field: FieldName) -> &'static [Strategy] {
        if field.is_outcome() {
            OUTCOME_CHAIN
        } else {
            GENERIC_CHAIN
        }
    }

    /// Whether the strategy runs, given how the previous one ended
    ///
    /// Count-then-itemize only rescues answers that could not be parsed.
    pub(crate) fn runs_after(&self, previous: Option<&Attempt>) -> bool {
        match self {
            Strategy::CountThenItemize => matches!(previous, Some(Attempt::Unparseable(_))),
            _ => true,
        }
    }

    /// Provenance label for values this strategy produces
    pub fn source_label(&self) -> &'static str {
        match self {
            Strategy::PlannedChunk => "planned chunk",
            Strategy::FullDocument => "full document",
            Strategy::StructuredOutcomes => "structured outcome query",
            Strategy::CountThenItemize => "outcome count-then-itemize",
        }
    }
}

/// What the oracle gave back for one field, before validation
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lookup {
    Value(String),
    Failed(Attempt),
}

/// How an unsuccessful attempt ended
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Attempt {
    NotFound,
    Rejected(String),
    OracleError(String),
    Unparseable(String),
}

impl Attempt {
    fn rank(&self) -> u8 {
        match self {
            Attempt::NotFound => 0,
            Attempt::OracleError(_) | Attempt::Unparseable(_) => 1,
            Attempt::Rejected(_) => 2,
        }
    }
}

/// Failure kind and message for a field whose chain is exhausted
///
/// A rejection outranks an oracle error, which outranks "not found", so a
/// fabricated value is never reported as a plain miss.
pub(crate) fn classify(attempts: &[Attempt]) -> (FailureKind, String) {
    let worst = attempts
        .iter()
        .enumerate()
        .max_by_key(|(i, a)| (a.rank(), *i))
        .map(|(_, a)| a);

    match worst {
        None | Some(Attempt::NotFound) => (FailureKind::NotFound, "not found in document".to_string()),
        Some(Attempt::Rejected(reason)) => (FailureKind::Rejected, format!("rejected: {}", reason)),
        Some(Attempt::OracleError(message)) => (FailureKind::OracleError, message.clone()),
        Some(Attempt::Unparseable(message)) => {
            (FailureKind::OracleError, format!("unparseable answer: {}", message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chains() {
        assert_eq!(
            Strategy::chain_for(FieldName::Sponsor),
            &[Strategy::PlannedChunk, Strategy::FullDocument]
        );
        assert_eq!(
            Strategy::chain_for(FieldName::SecondaryOutcomeMeasures),
            &[Strategy::StructuredOutcomes, Strategy::CountThenItemize]
        );
    }

    #[test]
    fn test_fallback_only_after_unparseable() {
        let fallback = Strategy::CountThenItemize;
        assert!(fallback.runs_after(Some(&Attempt::Unparseable("x".into()))));
        assert!(!fallback.runs_after(Some(&Attempt::NotFound)));
        assert!(!fallback.runs_after(None));
        assert!(Strategy::FullDocument.runs_after(Some(&Attempt::NotFound)));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&[]).0, FailureKind::NotFound);
        assert_eq!(
            classify(&[Attempt::NotFound, Attempt::OracleError("timeout".into())]),
            (FailureKind::OracleError, "timeout".to_string())
        );
        let (kind, message) = classify(&[
            Attempt::Rejected("value not found in source text".into()),
            Attempt::NotFound,
        ]);
        assert_eq!(kind, FailureKind::Rejected);
        assert!(message.contains("not found in source text"));
    }
}
