//! Trialmine Reconciliation
//!
//! Everything that looks at more than one source of truth at once:
//!
//! - [`ComparisonEngine`]: is an extracted value equivalent to the registry's?
//! - [`ReferenceRecord`]: the registry row for a case, loaded from CSV
//! - [`MergeEngine`]: one unified record from the per-document checkpoints of a case
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use trialmine_domain::{DocumentType, ExtractionCheckpoint, FieldName, FieldUpdate};
//! use trialmine_reconcile::MergeEngine;
//!
//! let mut protocol = ExtractionCheckpoint::new(
//!     "NCT01234567", "prot.pdf", DocumentType::Protocol, &[FieldName::Sponsor], "fp",
//! );
//! protocol.apply(FieldName::Sponsor, FieldUpdate::in_progress()).unwrap();
//! protocol.apply(FieldName::Sponsor, FieldUpdate::completed("Acme Corp")).unwrap();
//!
//! let mut docs = BTreeMap::new();
//! docs.insert(DocumentType::Protocol, protocol);
//! let record = MergeEngine::new().merge("NCT01234567", &docs);
//! assert_eq!(record.value(FieldName::Sponsor), Some("Acme Corp"));
//! ```

#![warn(missing_docs)]

mod canonical;
mod compare;
mod error;
mod merge;
mod reference;

pub use compare::{Comparison, ComparisonCache, ComparisonEngine, StudyComparison};
pub use error::ReconcileError;
pub use merge::MergeEngine;
pub use reference::ReferenceRecord;
