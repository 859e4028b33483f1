//! Extraction checkpoint - durable per-document, per-field progress
//!
//! A checkpoint is created once per `(case_id, document_type)` with every
//! target field PENDING. All mutation goes through [`ExtractionCheckpoint::apply`],
//! which enforces the status state machine and keeps the counters in step with
//! the field map.

use crate::{DocumentType, ExtractionStatus, FieldName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Why a field ended up FAILED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The oracle call itself failed (network, rate limit, malformed reply)
    OracleError,
    /// The oracle answered that the field is absent
    NotFound,
    /// A value came back but the validator refused it
    Rejected,
}

/// A field update refused by the status state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition(pub String);

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvalidTransition {}

/// State of one field within one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldExtraction {
    /// Field this entry tracks
    pub field_name: FieldName,

    /// Extracted value, if any
    pub value: Option<String>,

    /// Current status
    pub status: ExtractionStatus,

    /// When the field last reached a terminal status
    pub extraction_time: Option<DateTime<Utc>>,

    /// Confidence attached to the value
    pub confidence: Option<f64>,

    /// Failure description
    pub error_message: Option<String>,

    /// Where the value came from (chunk label, "full document", filename)
    pub source_text: Option<String>,

    /// Failure category; absent in files written before it existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
}

impl FieldExtraction {
    /// A fresh PENDING entry
    pub fn pending(field_name: FieldName) -> Self {
        Self {
            field_name,
            value: None,
            status: ExtractionStatus::Pending,
            extraction_time: None,
            confidence: None,
            error_message: None,
            source_text: None,
            failure_kind: None,
        }
    }
}

/// A requested change to one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    /// Target status
    pub status: ExtractionStatus,
    /// New value (COMPLETED / SKIPPED)
    pub value: Option<String>,
    /// Failure description (FAILED)
    pub error: Option<String>,
    /// Failure category (FAILED)
    pub failure_kind: Option<FailureKind>,
    /// Confidence of the value
    pub confidence: Option<f64>,
    /// Provenance label
    pub source_text: Option<String>,
}

impl FieldUpdate {
    fn bare(status: ExtractionStatus) -> Self {
        Self {
            status,
            value: None,
            error: None,
            failure_kind: None,
            confidence: None,
            source_text: None,
        }
    }

    /// Move to IN_PROGRESS
    pub fn in_progress() -> Self {
        Self::bare(ExtractionStatus::InProgress)
    }

    /// Move back to PENDING
    pub fn pending() -> Self {
        Self::bare(ExtractionStatus::Pending)
    }

    /// Record an accepted value
    pub fn completed(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::bare(ExtractionStatus::Completed)
        }
    }

    /// Record a failure
    pub fn failed(kind: FailureKind, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            failure_kind: Some(kind),
            ..Self::bare(ExtractionStatus::Failed)
        }
    }

    /// Record a side-channel value
    pub fn skipped(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::bare(ExtractionStatus::Skipped)
        }
    }

    /// Attach a confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Attach a provenance label
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_text = Some(source.into());
        self
    }
}

/// Per-document extraction progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionCheckpoint {
    /// Case (trial) identifier
    pub case_id: String,

    /// Path of the source document
    pub document_path: String,

    /// Kind of source document
    pub document_type: DocumentType,

    /// Number of target fields
    pub total_fields: usize,

    /// Fields in COMPLETED
    pub completed_fields: usize,

    /// Fields in FAILED
    pub failed_fields: usize,

    /// Fields in SKIPPED
    pub skipped_fields: usize,

    /// When the checkpoint was created
    pub start_time: DateTime<Utc>,

    /// When the checkpoint was last mutated or saved
    pub last_update: DateTime<Utc>,

    /// Per-field state
    pub fields: BTreeMap<FieldName, FieldExtraction>,

    /// Content hash of the source text
    pub text_fingerprint: String,
}

impl ExtractionCheckpoint {
    /// Create a checkpoint with every target field PENDING
    pub fn new(
        case_id: impl Into<String>,
        document_path: impl Into<String>,
        document_type: DocumentType,
        target_fields: &[FieldName],
        text_fingerprint: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let fields: BTreeMap<_, _> = target_fields
            .iter()
            .map(|f| (*f, FieldExtraction::pending(*f)))
            .collect();

        Self {
            case_id: case_id.into(),
            document_path: document_path.into(),
            document_type,
            total_fields: fields.len(),
            completed_fields: 0,
            failed_fields: 0,
            skipped_fields: 0,
            start_time: now,
            last_update: now,
            fields,
            text_fingerprint: text_fingerprint.into(),
        }
    }

    /// Apply a status change to one field
    ///
    /// Illegal transitions and unknown fields are refused and leave the
    /// checkpoint untouched.
    pub fn apply(&mut self, field: FieldName, update: FieldUpdate) -> Result<(), String> {
        let entry = self
            .fields
            .get_mut(&field)
            .ok_or_else(|| format!("Field {} is not tracked by this checkpoint", field))?;

        if !entry.status.can_transition_to(update.status) {
            return Err(format!(
                "Illegal transition for {}: {} -> {}",
                field, entry.status, update.status
            ));
        }

        let now = Utc::now();
        entry.status = update.status;
        match update.status {
            ExtractionStatus::Pending | ExtractionStatus::InProgress => {
                entry.error_message = None;
                entry.failure_kind = None;
            }
            ExtractionStatus::Completed | ExtractionStatus::Skipped => {
                entry.value = update.value;
                entry.confidence = update.confidence;
                entry.source_text = update.source_text;
                entry.error_message = None;
                entry.failure_kind = None;
                entry.extraction_time = Some(now);
            }
            ExtractionStatus::Failed => {
                entry.value = None;
                entry.confidence = None;
                entry.source_text = update.source_text;
                entry.error_message = update.error;
                entry.failure_kind = update.failure_kind;
                entry.extraction_time = Some(now);
            }
        }

        self.refresh_counters();
        self.last_update = now;
        Ok(())
    }

    /// Recompute the status counters from the field map
    pub fn refresh_counters(&mut self) {
        self.total_fields = self.fields.len();
        self.completed_fields = self.count(ExtractionStatus::Completed);
        self.failed_fields = self.count(ExtractionStatus::Failed);
        self.skipped_fields = self.count(ExtractionStatus::Skipped);
    }

    fn count(&self, status: ExtractionStatus) -> usize {
        self.fields.values().filter(|f| f.status == status).count()
    }

    /// Every field has reached a terminal status
    pub fn is_complete(&self) -> bool {
        self.completed_fields + self.failed_fields + self.skipped_fields == self.total_fields
    }

    /// Share of fields in a terminal status, 0-100
    pub fn progress_percentage(&self) -> f64 {
        if self.total_fields == 0 {
            return 100.0;
        }
        let done = self.completed_fields + self.failed_fields + self.skipped_fields;
        done as f64 * 100.0 / self.total_fields as f64
    }

    /// Look up one field
    pub fn field(&self, field: FieldName) -> Option<&FieldExtraction> {
        self.fields.get(&field)
    }

    /// Value of a COMPLETED or SKIPPED field
    pub fn resolved_value(&self, field: FieldName) -> Option<&str> {
        self.fields.get(&field).and_then(|f| match f.status {
            ExtractionStatus::Completed | ExtractionStatus::Skipped => {
                f.value.as_deref().filter(|v| !v.trim().is_empty())
            }
            _ => None,
        })
    }

    /// Fields in a given status, in map order
    pub fn fields_with_status(&self, status: ExtractionStatus) -> Vec<FieldName> {
        self.fields
            .values()
            .filter(|f| f.status == status)
            .map(|f| f.field_name)
            .collect()
    }

    /// Put fields left IN_PROGRESS by an interrupted run back to PENDING
    ///
    /// Returns the number of fields reset.
    pub fn reset_interrupted(&mut self) -> usize {
        let stuck = self.fields_with_status(ExtractionStatus::InProgress);
        for field in &stuck {
            // InProgress -> Pending is always legal
            let _ = self.apply(*field, FieldUpdate::pending());
        }
        stuck.len()
    }

    /// Condensed view for listings
    pub fn summary(&self) -> CheckpointSummary {
        CheckpointSummary {
            case_id: self.case_id.clone(),
            document_type: self.document_type,
            document_path: self.document_path.clone(),
            completed_fields: self.completed_fields,
            failed_fields: self.failed_fields,
            skipped_fields: self.skipped_fields,
            total_fields: self.total_fields,
            progress_percentage: self.progress_percentage(),
            last_update: self.last_update,
            is_complete: self.is_complete(),
        }
    }
}

/// Condensed checkpoint description returned by listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSummary {
    /// Case identifier
    pub case_id: String,
    /// Document type
    pub document_type: DocumentType,
    /// Source document path
    pub document_path: String,
    /// Completed count
    pub completed_fields: usize,
    /// Failed count
    pub failed_fields: usize,
    /// Skipped count
    pub skipped_fields: usize,
    /// Total target fields
    pub total_fields: usize,
    /// Terminal share, 0-100
    pub progress_percentage: f64,
    /// Last mutation time
    pub last_update: DateTime<Utc>,
    /// Whether every field is terminal
    pub is_complete: bool,
}
