//! Request and result types for the Extractor

use serde::{Deserialize, Serialize};
use std::fmt;
use trialmine_domain::{ComparisonResult, DocumentType, ExtractionCheckpoint, FieldName};
use trialmine_reconcile::ReferenceRecord;

/// Request to extract fields from one document
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Case (trial) identifier
    pub case_id: String,

    /// Path of the source document, recorded for provenance
    pub document_path: String,

    /// Kind of document
    pub document_type: DocumentType,

    /// Plain text of the document
    pub text: String,

    /// Fields to extract; `None` means every document field
    pub target_fields: Option<Vec<FieldName>>,

    /// Registry row to compare completed fields against
    pub reference: Option<ReferenceRecord>,
}

impl ExtractionRequest {
    /// Request for every document field with no reference comparison
    pub fn new(
        case_id: impl Into<String>,
        document_path: impl Into<String>,
        document_type: DocumentType,
        text: impl Into<String>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            document_path: document_path.into(),
            document_type,
            text: text.into(),
            target_fields: None,
            reference: None,
        }
    }

    /// Restrict extraction to these fields
    pub fn with_fields(mut self, fields: Vec<FieldName>) -> Self {
        self.target_fields = Some(fields);
        self
    }

    /// Compare completed fields against a reference record
    pub fn with_reference(mut self, reference: ReferenceRecord) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Result of one extraction run
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    /// Checkpoint as persisted at the end of the run
    pub checkpoint: ExtractionCheckpoint,

    /// Whether the run continued an existing checkpoint
    pub resumed: bool,

    /// Fields attempted in this run
    pub fields_attempted: usize,

    /// Fields that reached COMPLETED in this run
    pub fields_completed: usize,

    /// Verdicts for fields completed in this run, when a reference was given
    pub comparisons: Vec<ComparisonResult>,
}

/// One outcome measure as returned by the structured outcome query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeItem {
    /// Name of the outcome or endpoint
    pub outcome_measure: String,

    /// When it is measured
    #[serde(default)]
    pub outcome_time_frame: Option<String>,

    /// Additional detail
    #[serde(default)]
    pub outcome_description: Option<String>,
}

impl fmt::Display for OutcomeItem {
    /// Registry style: `Measure [Time Frame: ...]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let measure = self.outcome_measure.trim();
        match self
            .outcome_time_frame
            .as_deref()
            .and_then(trialmine_domain::normalize_answer)
        {
            Some(time_frame) => write!(f, "{} [Time Frame: {}]", measure, time_frame),
            None => f.write_str(measure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_item_display() {
        let item = OutcomeItem {
            outcome_measure: " Overall response rate ".into(),
            outcome_time_frame: Some("Not specified".into()),
            outcome_description: None,
        };
        assert_eq!(item.to_string(), "Overall response rate");

        let item = OutcomeItem {
            outcome_time_frame: Some("Up to 24 months".into()),
            ..item
        };
        assert_eq!(item.to_string(), "Overall response rate [Time Frame: Up to 24 months]");
    }

    #[test]
    fn test_request_builder() {
        let request = ExtractionRequest::new("NCT01234567", "prot.txt", DocumentType::Protocol, "text")
            .with_fields(vec![FieldName::Sponsor]);
        assert_eq!(request.target_fields, Some(vec![FieldName::Sponsor]));
        assert!(request.reference.is_none());
    }
}
