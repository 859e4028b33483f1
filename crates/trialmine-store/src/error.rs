//! Store error types

use std::path::PathBuf;
use thiserror::Error;
use trialmine_domain::InvalidTransition;

/// Errors that can occur during checkpoint persistence
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A checkpoint file exists but cannot be parsed
    #[error("Corrupt checkpoint {path}: {message}")]
    Corrupt {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// The requested field update violates the status state machine
    #[error("Invalid field update: {0}")]
    InvalidTransition(#[from] InvalidTransition),
}
