//! Error types for the Extractor

use thiserror::Error;
use trialmine_domain::DocumentType;

/// Errors that abort an extraction command
///
/// Per-field oracle failures and validator rejections are never reported
/// here; they end up as FAILED fields in the checkpoint.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Oracle call could not be scheduled
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// Checkpoint store error
    #[error("Store error: {0}")]
    Store(String),

    /// Source document could not be read
    #[error("Cannot read document {path}: {message}")]
    Document {
        /// Document path
        path: String,
        /// Underlying cause
        message: String,
    },

    /// Document bytes could not be turned into text
    #[error("Text extraction failed: {0}")]
    TextExtraction(String),

    /// Reference record could not be loaded
    #[error("Reference error: {0}")]
    Reference(String),

    /// No checkpoint exists to resume or compare
    #[error("No checkpoint for {case_id} {document_type}")]
    NoCheckpoint {
        /// Case identifier
        case_id: String,
        /// Document type
        document_type: DocumentType,
    },

    /// A case has no stored checkpoints at all
    #[error("No checkpoints for case {0}")]
    NoCheckpoints(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<trialmine_store::StoreError> for ExtractorError {
    fn from(e: trialmine_store::StoreError) -> Self {
        ExtractorError::Store(e.to_string())
    }
}

impl From<trialmine_reconcile::ReconcileError> for ExtractorError {
    fn from(e: trialmine_reconcile::ReconcileError) -> Self {
        ExtractorError::Reference(e.to_string())
    }
}
