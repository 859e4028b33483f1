//! Trialmine Extractor
//!
//! Pulls registry fields out of clinical-trial documents with an oracle,
//! trusting only what the validator can ground in the document text.
//!
//! # Overview
//!
//! A document is split into overlapping chunks, each chunk is asked which
//! fields it holds, and every pending field is then queried (grouped with the
//! fields it usually appears next to) against its best chunk, falling back to
//! the whole document. Outcome measures have their own structured query with a
//! count-then-itemize fallback. Each value passes the tiered validator before
//! it is recorded, and every status change is persisted right away so an
//! interrupted run picks up where it stopped.
//!
//! # Architecture
//!
//! ```text
//! Document → Chunker → Mapper → Strategy chain → Oracle → Gatekeeper → Checkpoint
//!                                                              └→ ComparisonEngine (optional)
//! ```
//!
//! # Key Features
//!
//! - **Resumable**: checkpoints keyed by case and document type, invalidated by
//!   a content fingerprint when the source text changes
//! - **Grounded**: values that cannot be found in the source are rejected and
//!   recorded as such, never silently kept
//! - **Degrades per field**: oracle failures fail a field, not the run
//! - **Side channel**: trial identifiers in file names skip the oracle
//!
//! # Example Usage
//!
//! ```no_run
//! use trialmine_extractor::{ExtractionRequest, Extractor, ExtractorConfig};
//! use trialmine_domain::DocumentType;
//! use trialmine_gatekeeper::Gatekeeper;
//! use trialmine_llm::MockOracle;
//! use trialmine_store::CheckpointManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let oracle = MockOracle::new("sponsor: Acme Corp");
//! let store = CheckpointManager::new("./checkpoints")?;
//! let extractor = Extractor::new(oracle, store, Gatekeeper::default_config(), ExtractorConfig::default());
//!
//! let request = ExtractionRequest::new(
//!     "NCT01234567",
//!     "NCT01234567_Prot_000.txt",
//!     DocumentType::Protocol,
//!     "Sponsor: Acme Corp ...",
//! );
//! let outcome = extractor.extract(request).await?;
//!
//! println!(
//!     "{}/{} fields completed",
//!     outcome.checkpoint.completed_fields, outcome.checkpoint.total_fields
//! );
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod extractor;
mod filename;
mod mapper;
mod oracle;
mod outcome;
mod parser;
mod prompt;
mod service;
mod strategy;
mod text;
mod types;

#[cfg(test)]
mod tests;

pub use chunking::{page_breaks_from_markers, DocumentChunker};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use filename::FilenameMetadata;
pub use mapper::ChunkFieldMapper;
pub use parser::{parse_chunk_mapping, parse_field_answers, parse_outcome_items};
pub use prompt::field_prompt;
pub use service::ExtractionService;
pub use strategy::Strategy;
pub use text::PlainTextExtractor;
pub use types::{ExtractionOutcome, ExtractionRequest, OutcomeItem};
