//! Semantic comparison of extracted values against reference values

use crate::canonical;
use crate::ReferenceRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use trialmine_domain::traits::FieldOracle;
use trialmine_domain::{ComparisonResult, DocumentType, ExtractionCheckpoint, FieldName};

/// Verdict of one comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Whether the two values are equivalent
    pub is_match: bool,
    /// Confidence in the verdict, 0.0-1.0
    pub confidence: f64,
    /// Explanation
    pub explanation: String,
}

impl Comparison {
    fn new(is_match: bool, confidence: f64, explanation: impl Into<String>) -> Self {
        Self {
            is_match,
            confidence: confidence.clamp(0.0, 1.0),
            explanation: explanation.into(),
        }
    }

    fn parse_error() -> Self {
        Self::new(false, 0.0, "parse error")
    }
}

type CacheKey = (FieldName, String, String);

/// Memo of oracle verdicts, keyed on the field and the unordered value pair
///
/// Clones share storage, so one cache can be handed to several engines.
#[derive(Debug, Clone, Default)]
pub struct ComparisonCache {
    entries: Arc<Mutex<HashMap<CacheKey, Comparison>>>,
}

impl ComparisonCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Comparison>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn key(field: FieldName, a: &str, b: &str) -> CacheKey {
        let (a, b) = (canonical::simple(a), canonical::simple(b));
        if a <= b {
            (field, a, b)
        } else {
            (field, b, a)
        }
    }

    fn get(&self, field: FieldName, a: &str, b: &str) -> Option<Comparison> {
        self.entries().get(&Self::key(field, a, b)).cloned()
    }

    fn insert(&self, field: FieldName, a: &str, b: &str, verdict: Comparison) {
        self.entries().insert(Self::key(field, a, b), verdict);
    }

    /// Drop every cached verdict
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Number of cached verdicts
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Per-study comparison report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyComparison {
    /// Case identifier
    pub case_id: String,
    /// Document the values came from
    pub document_type: Option<DocumentType>,
    /// One result per field present on both sides
    pub results: Vec<ComparisonResult>,
    /// Fields the reference has but the extraction lacks
    pub missing_in_extraction: Vec<FieldName>,
    /// Fields the extraction has but the reference lacks
    pub missing_in_reference: Vec<FieldName>,
}

impl StudyComparison {
    /// Number of matching fields
    pub fn matches(&self) -> usize {
        self.results.iter().filter(|r| r.is_match).count()
    }

    /// Number of mismatching fields
    pub fn mismatches(&self) -> usize {
        self.results.len() - self.matches()
    }

    /// matches / compared, 0.0 when nothing was compared
    pub fn accuracy(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.matches() as f64 / self.results.len() as f64
    }
}

#[derive(Deserialize)]
struct OracleVerdict {
    #[serde(rename = "match")]
    is_match: bool,
    confidence: f64,
    #[serde(default)]
    explanation: String,
}

/// Scores equivalence between extracted and reference values
///
/// Exact and canonical matches are decided locally; anything else goes to the
/// oracle with field-specific guidance, and the verdict is cached.
pub struct ComparisonEngine<O: FieldOracle> {
    oracle: Arc<O>,
    cache: ComparisonCache,
}

impl<O> ComparisonEngine<O>
where
    O: FieldOracle,
    O::Error: Display,
{
    /// Create an engine with a private cache
    pub fn new(oracle: Arc<O>) -> Self {
        Self::with_cache(oracle, ComparisonCache::new())
    }

    /// Create an engine that uses an existing cache
    pub fn with_cache(oracle: Arc<O>, cache: ComparisonCache) -> Self {
        Self { oracle, cache }
    }

    /// The engine's cache
    pub fn cache(&self) -> &ComparisonCache {
        &self.cache
    }

    /// Compare one extracted value with its reference value
    pub fn compare(&self, field: FieldName, extracted: &str, reference: &str) -> Comparison {
        if canonical::simple(extracted) == canonical::simple(reference) {
            return Comparison::new(true, 1.0, "exact match");
        }

        if let Some(how) = canonical::equivalent(field, extracted, reference) {
            return Comparison::new(true, 0.95, how);
        }

        if let Some(cached) = self.cache.get(field, extracted, reference) {
            debug!("Comparison cache hit for {}", field);
            return cached;
        }

        let prompt = comparison_prompt(field, extracted, reference);
        let verdict = match self.oracle.ask(&prompt) {
            Ok(answer) => match parse_verdict(&answer) {
                Some(verdict) => verdict,
                None => return Comparison::parse_error(),
            },
            Err(e) => {
                warn!("Comparison oracle failed for {}: {}", field, e);
                return Comparison::new(false, 0.0, format!("oracle error: {}", e));
            }
        };

        self.cache.insert(field, extracted, reference, verdict.clone());
        verdict
    }

    /// Compare one field and wrap the verdict as a [`ComparisonResult`]
    pub fn compare_field(&self, field: FieldName, extracted: &str, reference: &str) -> ComparisonResult {
        let verdict = self.compare(field, extracted, reference);
        ComparisonResult {
            field_name: field,
            extracted_value: extracted.to_string(),
            reference_value: reference.to_string(),
            is_match: verdict.is_match,
            similarity_score: verdict.confidence,
            notes: verdict.explanation,
        }
    }

    /// Compare every resolved field of a checkpoint with the reference record
    pub fn compare_checkpoint(
        &self,
        checkpoint: &ExtractionCheckpoint,
        reference: &ReferenceRecord,
    ) -> StudyComparison {
        let mut report = StudyComparison {
            case_id: checkpoint.case_id.clone(),
            document_type: Some(checkpoint.document_type),
            ..Default::default()
        };

        for field in checkpoint.fields.keys().copied() {
            match (checkpoint.resolved_value(field), reference.value_for(field)) {
                (Some(extracted), Some(expected)) => {
                    let result = self.compare_field(field, extracted, expected);
                    if result.is_match {
                        info!("MATCH {} ({:.2}): {}", field, result.similarity_score, result.notes);
                    } else {
                        warn!(
                            "MISMATCH {}: extracted '{}' vs reference '{}'",
                            field, extracted, expected
                        );
                    }
                    report.results.push(result);
                }
                (None, Some(_)) => report.missing_in_extraction.push(field),
                (Some(_), None) => report.missing_in_reference.push(field),
                (None, None) => {}
            }
        }

        info!(
            "Compared {} {}: {}/{} fields match",
            report.case_id,
            checkpoint.document_type,
            report.matches(),
            report.results.len()
        );
        report
    }
}

fn field_guidance(field: FieldName) -> &'static str {
    match field {
        FieldName::Phases => {
            "Phase notation varies: 'Phase 2', 'Phase II', 'PHASE2' are the same. \
             'Phase 1/Phase 2' equals 'PHASE1, PHASE2'."
        }
        FieldName::Enrollment => {
            "Compare the participant counts only; ignore words such as 'approximately', \
             'participants' or '(Actual)'."
        }
        FieldName::Sponsor | FieldName::Collaborators => {
            "Organization names vary in legal suffixes (Inc, Ltd, GmbH), abbreviations and \
             punctuation. Treat subsidiaries and the parent company as different."
        }
        FieldName::StartDate
        | FieldName::PrimaryCompletionDate
        | FieldName::CompletionDate
        | FieldName::FirstPosted
        | FieldName::ResultsFirstPosted
        | FieldName::LastUpdatePosted => {
            "Dates may be written in different formats or at month precision; \
             they match if they denote the same month and year."
        }
        FieldName::Age => {
            "Age groups may be given as categories (CHILD, ADULT, OLDER_ADULT) or as ranges \
             ('18 Years and older'); match if they cover the same population."
        }
        FieldName::Sex => "ALL, 'Both' and 'Male and Female' are the same.",
        f if f.is_multi_value() => {
            "This is a semicolon-separated list. Order does not matter; type labels such as \
             'DRUG:' and minor wording differences are acceptable."
        }
        _ => "Minor wording, capitalization and punctuation differences are acceptable.",
    }
}

fn comparison_prompt(field: FieldName, extracted: &str, reference: &str) -> String {
    format!(
        "VALUE COMPARISON\n\
         Field: {field} ({description})\n\
         Guidance: {guidance}\n\n\
         Extracted value: {extracted}\n\
         Reference value: {reference}\n\n\
         Do these two values express the same information for this field?\n\
         Respond with JSON only: {{\"match\": true|false, \"confidence\": 0.0-1.0, \"explanation\": \"...\"}}",
        field = field,
        description = field.description(),
        guidance = field_guidance(field),
        extracted = extracted,
        reference = reference,
    )
}

/// Parse the oracle's JSON verdict, tolerating surrounding commentary
fn parse_verdict(answer: &str) -> Option<Comparison> {
    let (Some(start), Some(end)) = (answer.find('{'), answer.rfind('}')) else {
        debug!("Comparison verdict has no JSON object");
        return None;
    };
    if end < start {
        return None;
    }
    match serde_json::from_str::<OracleVerdict>(&answer[start..=end]) {
        Ok(v) => Some(Comparison::new(v.is_match, v.confidence, v.explanation)),
        Err(e) => {
            debug!("Unparseable comparison verdict: {}", e);
            None
        }
    }
}
