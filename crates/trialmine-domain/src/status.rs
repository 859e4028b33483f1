//! Per-field extraction status and its allowed transitions

use serde::{Deserialize, Serialize};

/// Lifecycle state of one field within one document
///
/// ```text
/// PENDING ──► IN_PROGRESS ──► COMPLETED
///    │             │
///    │             └────────► FAILED ──► IN_PROGRESS (retry)
///    └──► SKIPPED
/// ```
///
/// IN_PROGRESS may also fall back to PENDING when a run is resumed after an
/// interruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// Not attempted yet
    #[default]
    Pending,
    /// An oracle call is in flight
    InProgress,
    /// A validator-approved value was recorded
    Completed,
    /// Not found, oracle error, or rejected by the validator
    Failed,
    /// Filled from a trusted side channel without asking the oracle
    Skipped,
}

impl ExtractionStatus {
    /// Status name as stored on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Pending => "pending",
            ExtractionStatus::InProgress => "in_progress",
            ExtractionStatus::Completed => "completed",
            ExtractionStatus::Failed => "failed",
            ExtractionStatus::Skipped => "skipped",
        }
    }

    /// Whether the field counts towards checkpoint completion
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExtractionStatus::Completed | ExtractionStatus::Failed | ExtractionStatus::Skipped
        )
    }

    /// Check whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: ExtractionStatus) -> bool {
        use ExtractionStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Skipped)
                | (InProgress, Completed)
                | (InProgress, Failed)
                | (InProgress, Pending)
                | (Failed, InProgress)
        )
    }
}

impl std::fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
