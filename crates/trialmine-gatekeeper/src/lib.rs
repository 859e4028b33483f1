//! Trialmine Gatekeeper
//!
//! Decides whether an oracle answer is acceptable evidence for a field.
//!
//! The Gatekeeper provides:
//! - Tiered acceptance rules (verbatim, summary, inferred, registry-only)
//! - Literal matching with label and punctuation tolerance for verbatim fields
//! - Salient-term overlap scoring for synthesized fields
//! - A document-wide cross-check of the trial identifier
//!
//! # Examples
//!
//! ```
//! use trialmine_domain::FieldName;
//! use trialmine_gatekeeper::{Gatekeeper, ValidationConfig};
//!
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default());
//! let source = "Sponsor: Acme Corp. Registered as NCT01234567.";
//!
//! assert!(gatekeeper.validate(FieldName::Sponsor, Some("Acme Corp"), source).is_accepted());
//! assert!(!gatekeeper.validate(FieldName::NctNumber, Some("NCT09999999"), source).is_accepted());
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod terms;
mod validator;

pub use config::ValidationConfig;
pub use error::GatekeeperError;
pub use terms::{identifiers_in, key_terms, phases_in};
pub use validator::{Gatekeeper, RejectionReason, ValidationResult, ValidationStatus};
