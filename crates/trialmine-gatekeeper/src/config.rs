//! Gatekeeper configuration

use crate::GatekeeperError;
use serde::{Deserialize, Serialize};

/// Configuration for validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum share of salient terms a summary-tier value must share with the source (0.0-1.0)
    pub summary_term_ratio: f64,

    /// Maximum number of salient terms sampled from a summary-tier value
    pub max_key_terms: usize,

    /// Reject identifiers that are not among those printed in the document
    pub cross_check_identifier: bool,

    /// Log verbatim values that only partially appear in the source
    pub log_partial_matches: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            summary_term_ratio: 0.3,
            max_key_terms: 10,
            cross_check_identifier: true,
            log_partial_matches: true,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (paraphrase-friendly)
    pub fn permissive() -> Self {
        Self {
            summary_term_ratio: 0.1,
            max_key_terms: 10,
            cross_check_identifier: true,
            log_partial_matches: false,
        }
    }

    /// Create a strict configuration (most terms must be grounded)
    pub fn strict() -> Self {
        Self {
            summary_term_ratio: 0.6,
            max_key_terms: 20,
            cross_check_identifier: true,
            log_partial_matches: true,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        if !(0.0..=1.0).contains(&self.summary_term_ratio) {
            return Err(GatekeeperError::Config(
                "summary_term_ratio must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.max_key_terms == 0 {
            return Err(GatekeeperError::Config(
                "max_key_terms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, GatekeeperError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
