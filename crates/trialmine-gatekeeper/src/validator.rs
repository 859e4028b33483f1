//! Tiered value validation

use crate::terms::{
    canonical_identifier, identifiers_in, key_terms, phases_in, squash_punctuation, strip_label,
};
use crate::ValidationConfig;
use std::fmt;
use tracing::{debug, info, warn};
use trialmine_domain::{FieldName, ValidationTier};

/// Result of validating one value
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the value passed validation
    pub status: ValidationStatus,

    /// Rejection reasons (if any)
    pub reasons: Vec<RejectionReason>,

    /// Share of components or key terms found in the source (0.0-1.0)
    pub match_ratio: f64,
}

impl ValidationResult {
    fn accepted(match_ratio: f64) -> Self {
        Self {
            status: ValidationStatus::Accepted,
            reasons: Vec::new(),
            match_ratio,
        }
    }

    fn rejected(reason: RejectionReason, match_ratio: f64) -> Self {
        Self {
            status: ValidationStatus::Rejected,
            reasons: vec![reason],
            match_ratio,
        }
    }

    /// Whether the value was accepted
    pub fn is_accepted(&self) -> bool {
        self.status == ValidationStatus::Accepted
    }

    /// Human-readable rejection reason, `None` when accepted
    pub fn reason(&self) -> Option<String> {
        if self.reasons.is_empty() {
            return None;
        }
        Some(
            self.reasons
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Value accepted
    Accepted,

    /// Value rejected
    Rejected,
}

/// Reasons for rejection
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// No value was supplied for a field that needs one
    MissingValue,

    /// None of the value's components occur in the source text
    NotInSource {
        /// Components that were looked for
        components: Vec<String>,
    },

    /// Too few salient terms occur in the source text
    InsufficientTermOverlap {
        /// Terms found
        found: usize,
        /// Terms sampled
        total: usize,
        /// Required ratio
        required: f64,
    },

    /// The identifier is not shaped like a registry identifier
    MalformedIdentifier(String),

    /// The identifier is not one of those printed in the document
    IdentifierMismatch {
        /// Identifier claimed by the oracle
        claimed: String,
        /// Identifiers present in the document
        present: Vec<String>,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::MissingValue => write!(f, "no value supplied"),
            RejectionReason::NotInSource { components } => {
                write!(f, "value not found in source text: {}", components.join("; "))
            }
            RejectionReason::InsufficientTermOverlap {
                found,
                total,
                required,
            } => write!(
                f,
                "only {}/{} key terms found in source text (need {:.0}%)",
                found,
                total,
                required * 100.0
            ),
            RejectionReason::MalformedIdentifier(value) => {
                write!(f, "identifier '{}' is not of the form NCT########", value)
            }
            RejectionReason::IdentifierMismatch { claimed, present } => write!(
                f,
                "identifier {} not among those in the document ({})",
                claimed,
                present.join(", ")
            ),
        }
    }
}

/// The Gatekeeper decides whether an oracle answer is trustworthy evidence
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a value for `field` against the full source text
    ///
    /// # Arguments
    ///
    /// * `field` - Field the value was extracted for
    /// * `value` - The oracle's answer, `None` when nothing was found
    /// * `source_text` - Text of the whole document
    pub fn validate(
        &self,
        field: FieldName,
        value: Option<&str>,
        source_text: &str,
    ) -> ValidationResult {
        let tier = field.tier();
        let value = match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => v,
            None if tier.accepts_absence() => return ValidationResult::accepted(1.0),
            None => return ValidationResult::rejected(RejectionReason::MissingValue, 0.0),
        };

        if field == FieldName::NctNumber {
            if let Some(rejection) = self.check_identifier(value, source_text) {
                warn!("Rejected {} = '{}': {}", field, value, rejection);
                return ValidationResult::rejected(rejection, 0.0);
            }
        }

        let result = match tier {
            ValidationTier::Verbatim => self.validate_verbatim(field, value, source_text),
            ValidationTier::Summary => self.validate_summary(value, source_text),
            ValidationTier::Inferred | ValidationTier::RegistryOnly => {
                ValidationResult::accepted(1.0)
            }
        };

        match result.reason() {
            Some(reason) => warn!("Rejected {} ({} tier): {}", field, tier, reason),
            None => debug!("Accepted {} ({} tier, ratio {:.2})", field, tier, result.match_ratio),
        }
        result
    }

    /// Every component must be found; some-but-not-all is accepted and logged
    fn validate_verbatim(&self, field: FieldName, value: &str, source_text: &str) -> ValidationResult {
        let components: Vec<&str> = if field.is_multi_value() {
            value
                .split(';')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect()
        } else {
            vec![value]
        };
        if components.is_empty() {
            return ValidationResult::rejected(RejectionReason::MissingValue, 0.0);
        }

        let lowered_source = source_text.to_lowercase();
        let squashed_source = squash_punctuation(source_text);

        let (found, missing): (Vec<&str>, Vec<&str>) = components
            .iter()
            .copied()
            .partition(|c| component_in_source(field, c, &lowered_source, &squashed_source));

        let ratio = found.len() as f64 / components.len() as f64;
        if found.is_empty() {
            return ValidationResult::rejected(
                RejectionReason::NotInSource {
                    components: components.iter().map(|c| c.to_string()).collect(),
                },
                0.0,
            );
        }

        if !missing.is_empty() && self.config.log_partial_matches {
            info!(
                "Partial match for {}: {}/{} components found, missing: {}",
                field,
                found.len(),
                components.len(),
                missing.join("; ")
            );
        }
        ValidationResult::accepted(ratio)
    }

    /// Reject wholesale fabrication while tolerating paraphrase
    fn validate_summary(&self, value: &str, source_text: &str) -> ValidationResult {
        let terms = key_terms(value, self.config.max_key_terms);
        if terms.is_empty() {
            return ValidationResult::accepted(1.0);
        }

        let lowered_source = source_text.to_lowercase();
        let found = terms
            .iter()
            .filter(|t| lowered_source.contains(&t.to_lowercase()))
            .count();
        let ratio = found as f64 / terms.len() as f64;

        if ratio < self.config.summary_term_ratio {
            return ValidationResult::rejected(
                RejectionReason::InsufficientTermOverlap {
                    found,
                    total: terms.len(),
                    required: self.config.summary_term_ratio,
                },
                ratio,
            );
        }
        ValidationResult::accepted(ratio)
    }

    /// Shape check plus document-wide identifier cross-check
    fn check_identifier(&self, value: &str, source_text: &str) -> Option<RejectionReason> {
        let Some(claimed) = canonical_identifier(value) else {
            return Some(RejectionReason::MalformedIdentifier(value.to_string()));
        };
        if !self.config.cross_check_identifier {
            return None;
        }

        let present = identifiers_in(source_text);
        if present.contains(&claimed) {
            return None;
        }
        Some(RejectionReason::IdentifierMismatch {
            claimed,
            present: present.into_iter().collect(),
        })
    }
}

fn component_in_source(field: FieldName, component: &str, lowered: &str, squashed: &str) -> bool {
    if field == FieldName::NctNumber {
        return canonical_identifier(component)
            .map(|id| identifiers_in(lowered).contains(&id))
            .unwrap_or(false);
    }

    let bare = strip_label(component);
    if lowered.contains(&bare.to_lowercase()) {
        return true;
    }
    if bare.chars().any(|c| c.is_ascii_punctuation()) {
        let needle = squash_punctuation(bare);
        if !needle.is_empty() && squashed.contains(&needle) {
            return true;
        }
    }
    if field == FieldName::Phases {
        let claimed = phases_in(bare);
        return !claimed.is_empty() && claimed.is_subset(&phases_in(lowered));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROTOCOL: &str = "CLINICAL STUDY PROTOCOL\n\
        Protocol number ABC-123. ClinicalTrials.gov identifier: NCT 01234567.\n\
        Sponsor: Acme Corp. Collaborator: Smith & Co., Inc.\n\
        This is a Phase 2, randomized trial of Pembrolizumab in adults with \
        metastatic melanoma. Approximately 120 participants will be enrolled.\n\
        Interventions: Pembrolizumab 200 mg IV every 3 weeks; placebo.";

    fn gatekeeper() -> Gatekeeper {
        Gatekeeper::default_config()
    }

    #[test]
    fn test_phase_spellings_match_document_wording() {
        let gk = gatekeeper();
        for answer in ["Phase 2", "PHASE2", "Phase II", "phase-2"] {
            let result = gk.validate(FieldName::Phases, Some(answer), PROTOCOL);
            assert!(result.is_accepted(), "{} should match", answer);
        }
        assert!(!gk.validate(FieldName::Phases, Some("PHASE3"), PROTOCOL).is_accepted());
        assert!(!gk
            .validate(FieldName::Phases, Some("PHASE1, PHASE2"), PROTOCOL)
            .is_accepted());
    }

    #[test]
    fn test_verbatim_exact_and_case_insensitive() {
        let gk = gatekeeper();
        assert!(gk.validate(FieldName::Sponsor, Some("Acme Corp"), PROTOCOL).is_accepted());
        assert!(gk.validate(FieldName::Sponsor, Some("ACME CORP"), PROTOCOL).is_accepted());
        assert!(gk.validate(FieldName::Enrollment, Some("120"), PROTOCOL).is_accepted());
    }

    #[test]
    fn test_verbatim_rejects_fabrication() {
        let result = gatekeeper().validate(FieldName::Sponsor, Some("Globex Pharma"), PROTOCOL);
        assert!(!result.is_accepted());
        assert!(matches!(result.reasons[0], RejectionReason::NotInSource { .. }));
        assert!(result.reason().unwrap().contains("Globex Pharma"));
    }

    #[test]
    fn test_verbatim_tolerates_punctuation() {
        let result = gatekeeper().validate(FieldName::Collaborators, Some("Smith & Co. Inc"), PROTOCOL);
        assert!(result.is_accepted());
    }

    #[test]
    fn test_verbatim_partial_list_is_accepted() {
        let result = gatekeeper().validate(
            FieldName::Conditions,
            Some("Metastatic Melanoma; Lung Cancer"),
            PROTOCOL,
        );
        assert!(result.is_accepted());
        assert_eq!(result.match_ratio, 0.5);
    }

    #[test]
    fn test_verbatim_list_with_no_hits_is_rejected() {
        let result = gatekeeper().validate(FieldName::Conditions, Some("Asthma; Gout"), PROTOCOL);
        assert!(!result.is_accepted());
    }

    #[test]
    fn test_identifier_variants_in_source() {
        let result = gatekeeper().validate(FieldName::NctNumber, Some("NCT01234567"), PROTOCOL);
        assert!(result.is_accepted());
    }

    #[test]
    fn test_identifier_cross_check_rejects_memorized_id() {
        let result = gatekeeper().validate(FieldName::NctNumber, Some("NCT07654321"), PROTOCOL);
        assert!(!result.is_accepted());
        match &result.reasons[0] {
            RejectionReason::IdentifierMismatch { claimed, present } => {
                assert_eq!(claimed, "NCT07654321");
                assert_eq!(present, &vec!["NCT01234567".to_string()]);
            }
            other => panic!("unexpected reason {:?}", other),
        }
    }

    #[test]
    fn test_malformed_identifier() {
        let result = gatekeeper().validate(FieldName::NctNumber, Some("ABC-123"), PROTOCOL);
        assert!(matches!(result.reasons[0], RejectionReason::MalformedIdentifier(_)));
    }

    #[test]
    fn test_summary_accepts_paraphrase() {
        let summary = "A randomized Phase 2 trial testing Pembrolizumab for adults with advanced melanoma";
        assert!(gatekeeper().validate(FieldName::BriefSummary, Some(summary), PROTOCOL).is_accepted());
    }

    #[test]
    fn test_summary_rejects_wholesale_fabrication() {
        let summary = "Evaluates Nivolumab and Ipilimumab in Hodgkin Lymphoma across Europe";
        let result = gatekeeper().validate(FieldName::BriefSummary, Some(summary), PROTOCOL);
        assert!(!result.is_accepted());
        assert!(matches!(result.reasons[0], RejectionReason::InsufficientTermOverlap { .. }));
    }

    #[test]
    fn test_inferred_is_permissive() {
        assert!(gatekeeper().validate(FieldName::Sex, Some("ALL"), PROTOCOL).is_accepted());
        assert!(!gatekeeper().validate(FieldName::Sex, None, PROTOCOL).is_accepted());
    }

    #[test]
    fn test_registry_only_accepts_absence() {
        assert!(gatekeeper().validate(FieldName::FirstPosted, None, PROTOCOL).is_accepted());
        assert!(gatekeeper().validate(FieldName::FirstPosted, Some("  "), PROTOCOL).is_accepted());
    }

    #[test]
    fn test_label_prefix_is_stripped() {
        let result = gatekeeper().validate(
            FieldName::Conditions,
            Some("Other: metastatic melanoma"),
            PROTOCOL,
        );
        assert!(result.is_accepted());
    }
}
