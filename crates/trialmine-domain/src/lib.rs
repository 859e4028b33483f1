//! Trialmine Domain Layer
//!
//! Core vocabulary and state model for clinical-trial field extraction.
//! Every other crate in the workspace depends on the types defined here.
//!
//! ## Key Concepts
//!
//! - **FieldName**: The closed set of registry fields we try to recover from a filing
//! - **ValidationTier**: How much evidence a field's value needs before it is trusted
//! - **ExtractionCheckpoint**: Per-document, per-field progress that survives interruption
//! - **DocumentChunk / ExtractionPlan**: Bounded slices of a document and the routing
//!   hints that say which slice to ask about which field
//! - **UnifiedRecord**: The merged, provenance-carrying view over all documents of a case
//!
//! ## Architecture
//!
//! This crate holds data and pure logic only. Oracles, persistence and the
//! extraction loop live in other crates and meet this one through the traits in
//! [`traits`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod answer;
pub mod checkpoint;
pub mod chunk;
pub mod document;
pub mod field;
pub mod record;
pub mod status;
pub mod tier;
pub mod traits;

// Re-exports for convenience
pub use answer::{is_not_found, normalize_answer};
pub use checkpoint::{
    CheckpointSummary, ExtractionCheckpoint, FailureKind, FieldExtraction, FieldUpdate,
    InvalidTransition,
};
pub use chunk::{ChunkMapping, DocumentChunk, ExtractionPlan};
pub use document::DocumentType;
pub use field::{FieldName, FIELD_GROUPS};
pub use record::{ComparisonResult, MergeStatistics, MergedField, SourceDocument, UnifiedRecord};
pub use status::ExtractionStatus;
pub use tier::ValidationTier;
