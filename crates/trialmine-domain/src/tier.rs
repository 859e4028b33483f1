//! Validation tiers - how much evidence a field value needs

use serde::{Deserialize, Serialize};

/// Acceptance rule applied to a field's value
///
/// - Verbatim: every component must appear literally in the source text
/// - Summary: enough salient terms must appear in the source text
/// - Inferred: derived from context, accepted permissively
/// - RegistryOnly: never present in a filing, absence is not a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationTier {
    /// Identifiers, dates, counts, names
    Verbatim,

    /// Synthesized prose and formatted lists
    Summary,

    /// Categorical values derived from context
    Inferred,

    /// Values that only exist in the external registry
    RegistryOnly,
}

impl ValidationTier {
    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationTier::Verbatim => "verbatim",
            ValidationTier::Summary => "summary",
            ValidationTier::Inferred => "inferred",
            ValidationTier::RegistryOnly => "registry_only",
        }
    }

    /// Whether a missing value is acceptable for this tier
    pub fn accepts_absence(&self) -> bool {
        matches!(self, ValidationTier::RegistryOnly)
    }
}

impl std::fmt::Display for ValidationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
