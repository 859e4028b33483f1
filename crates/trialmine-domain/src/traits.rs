//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{
    CheckpointSummary, DocumentType, ExtractionCheckpoint, FieldName, FieldUpdate,
    InvalidTransition,
};

/// Trait for the language oracle
///
/// Implemented by the infrastructure layer (trialmine-llm). Answers are free
/// text; callers parse them.
pub trait FieldOracle {
    /// Error type for oracle operations
    type Error;

    /// Send a prompt and return the raw answer
    fn ask(&self, prompt: &str) -> Result<String, Self::Error>;
}

/// Trait for turning document bytes into plain text
///
/// Implemented by the application layer (trialmine-extractor)
pub trait TextExtractor {
    /// Error type for extraction operations
    type Error;

    /// Extract plain text from raw document bytes
    fn extract(&self, document: &[u8]) -> Result<String, Self::Error>;
}

/// Trait for durable checkpoint storage
///
/// Implemented by the infrastructure layer (trialmine-store)
pub trait CheckpointStore {
    /// Error type for store operations
    type Error: From<InvalidTransition>;

    /// Persist a checkpoint, replacing any previous version
    fn save(&self, checkpoint: &mut ExtractionCheckpoint) -> Result<(), Self::Error>;

    /// Load the checkpoint for a case and document type
    fn load(
        &self,
        case_id: &str,
        document_type: DocumentType,
    ) -> Result<Option<ExtractionCheckpoint>, Self::Error>;

    /// Load a checkpoint only if it was built from text with this fingerprint
    ///
    /// Unreadable checkpoints and fingerprint drift both count as absent.
    fn load_valid(
        &self,
        case_id: &str,
        document_type: DocumentType,
        fingerprint: &str,
    ) -> Result<Option<ExtractionCheckpoint>, Self::Error>;

    /// Apply a field update and persist it immediately
    ///
    /// A refused update leaves both the checkpoint and storage untouched.
    fn update_field(
        &self,
        checkpoint: &mut ExtractionCheckpoint,
        field: FieldName,
        update: FieldUpdate,
    ) -> Result<(), Self::Error> {
        checkpoint.apply(field, update).map_err(InvalidTransition)?;
        self.save(checkpoint)
    }

    /// Remove a checkpoint; returns whether one existed
    fn delete(&self, case_id: &str, document_type: DocumentType) -> Result<bool, Self::Error>;

    /// Summaries of every stored checkpoint
    fn list(&self) -> Result<Vec<CheckpointSummary>, Self::Error>;
}
