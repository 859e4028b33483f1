//! Merged case records and comparison verdicts

use crate::{DocumentType, FieldName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One field of a unified record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MergedField {
    /// A document supplied the value
    Resolved {
        /// Winning value
        value: String,
        /// Document type that supplied it
        source_document: DocumentType,
        /// Path of that document
        source_path: String,
        /// When it was extracted
        extraction_time: Option<DateTime<Utc>>,
        /// Confidence recorded with it
        confidence: Option<f64>,
    },
    /// No document supplied a value
    Unresolved {
        /// Always null
        value: Option<String>,
        /// Documents that were consulted
        attempted_documents: Vec<DocumentType>,
    },
}

impl MergedField {
    /// Resolved value, if any
    pub fn value(&self) -> Option<&str> {
        match self {
            MergedField::Resolved { value, .. } => Some(value),
            MergedField::Unresolved { .. } => None,
        }
    }

    /// Document type that supplied the value
    pub fn source_document(&self) -> Option<DocumentType> {
        match self {
            MergedField::Resolved { source_document, .. } => Some(*source_document),
            MergedField::Unresolved { .. } => None,
        }
    }
}

/// A document that took part in a merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Document type
    pub document_type: DocumentType,
    /// Document path
    pub path: String,
}

/// Coverage figures computed once per merge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeStatistics {
    /// Fields considered
    pub total_fields: usize,
    /// Fields that received a value
    pub extracted_fields: usize,
    /// extracted / total, 0.0-1.0
    pub extraction_rate: f64,
    /// Winning values contributed per document type
    pub by_document: BTreeMap<DocumentType, usize>,
}

/// Unified view of one case across all its documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    /// Case identifier
    pub case_id: String,
    /// Documents that were merged
    pub source_documents: Vec<SourceDocument>,
    /// Per-field outcome
    pub fields: BTreeMap<FieldName, MergedField>,
    /// Coverage figures
    pub statistics: MergeStatistics,
}

impl UnifiedRecord {
    /// Value of a field, if resolved
    pub fn value(&self, field: FieldName) -> Option<&str> {
        self.fields.get(&field).and_then(|f| f.value())
    }
}

/// Verdict on one extracted value against its reference value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Field compared
    pub field_name: FieldName,
    /// Value from the document
    pub extracted_value: String,
    /// Value from the reference record
    pub reference_value: String,
    /// Whether the two are equivalent
    #[serde(rename = "match")]
    pub is_match: bool,
    /// Confidence of the verdict, 0.0-1.0
    pub similarity_score: f64,
    /// Explanation
    pub notes: String,
}
