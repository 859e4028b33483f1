//! Configuration for the Extractor

use serde::{Deserialize, Serialize};

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Target chunk size (bytes)
    pub target_chunk_size: usize,

    /// Bytes shared by adjacent chunks
    pub chunk_overlap: usize,

    /// How far back from a tentative cut to look for a paragraph or sentence break
    pub boundary_lookback: usize,

    /// Ask the oracle which chunk holds which field before extracting
    pub use_chunk_mapping: bool,

    /// Chunk text budget for one mapping call
    pub mapper_chunk_chars: usize,

    /// Text budget for one field query
    pub max_field_chars: usize,

    /// Text budget for the structured outcome query
    pub outcome_chars: usize,

    /// Text budget for each count-then-itemize outcome query
    pub outcome_fallback_chars: usize,

    /// Upper bound on outcomes itemized one by one
    pub max_outcome_items: usize,

    /// Retry FAILED fields when resuming
    pub retry_failed: bool,

    /// Also target fields that only exist in the registry
    pub include_registry_fields: bool,

    /// Take the trial identifier from the file name when present
    pub use_filename_side_channel: bool,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.target_chunk_size == 0 {
            return Err("target_chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.target_chunk_size {
            return Err("chunk_overlap must be smaller than target_chunk_size".to_string());
        }
        for (name, value) in [
            ("mapper_chunk_chars", self.mapper_chunk_chars),
            ("max_field_chars", self.max_field_chars),
            ("outcome_chars", self.outcome_chars),
            ("outcome_fallback_chars", self.outcome_fallback_chars),
            ("max_outcome_items", self.max_outcome_items),
        ] {
            if value == 0 {
                return Err(format!("{} must be greater than 0", name));
            }
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            target_chunk_size: 8_000,
            chunk_overlap: 1_000,
            boundary_lookback: 500,
            use_chunk_mapping: true,
            mapper_chunk_chars: 4_000,
            max_field_chars: 48_000,
            outcome_chars: 250_000,
            outcome_fallback_chars: 15_000,
            max_outcome_items: 10,
            retry_failed: true,
            include_registry_fields: false,
            use_filename_side_channel: true,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: fewer, cheaper oracle calls
    pub fn aggressive() -> Self {
        Self {
            target_chunk_size: 16_000,
            chunk_overlap: 500,
            use_chunk_mapping: false,
            max_field_chars: 24_000,
            outcome_chars: 60_000,
            outcome_fallback_chars: 10_000,
            max_outcome_items: 5,
            retry_failed: false,
            ..Self::default()
        }
    }

    /// Lenient preset: smaller chunks and larger budgets for better recall
    pub fn lenient() -> Self {
        Self {
            target_chunk_size: 6_000,
            chunk_overlap: 1_500,
            boundary_lookback: 800,
            mapper_chunk_chars: 6_000,
            max_field_chars: 96_000,
            outcome_fallback_chars: 30_000,
            max_outcome_items: 20,
            include_registry_fields: true,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
