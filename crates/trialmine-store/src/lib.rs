//! Trialmine Storage Layer
//!
//! File-per-key persistence for extraction checkpoints.
//!
//! # Features
//!
//! - One JSON file per `(case_id, document_type)`, named deterministically
//! - Atomic writes (temporary file plus rename)
//! - Content fingerprints that invalidate checkpoints when the source changes
//! - Listing by file contents, tolerant of corrupt files

#![warn(missing_docs)]

mod error;
mod fingerprint;
mod manager;

pub use error::StoreError;
pub use fingerprint::compute_fingerprint;
pub use manager::CheckpointManager;
