//! Reconciliation error types

use thiserror::Error;

/// Errors that can occur while loading reference data
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The reference file has a header but no rows
    #[error("Reference file has no data rows: {0}")]
    EmptyReference(String),
}
