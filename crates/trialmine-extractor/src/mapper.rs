//! Chunk-to-field routing hints

use crate::oracle::ask;
use crate::parser::parse_chunk_mapping;
use crate::prompt::chunk_analysis_prompt;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trialmine_domain::traits::FieldOracle;
use trialmine_domain::{ChunkMapping, DocumentChunk, ExtractionPlan, FieldName};

/// Asks the oracle which target fields each chunk plausibly contains
///
/// The result is a routing hint only. A chunk whose analysis fails
/// contributes an empty mapping instead of aborting the batch.
pub struct ChunkFieldMapper<O> {
    oracle: Arc<O>,
    targets: Vec<FieldName>,
    max_chars: usize,
}

impl<O> ChunkFieldMapper<O>
where
    O: FieldOracle + Send + Sync + 'static,
    O::Error: Display,
{
    /// Create a mapper for the given target fields
    pub fn new(oracle: Arc<O>, targets: Vec<FieldName>) -> Self {
        Self {
            oracle,
            targets,
            max_chars: 4_000,
        }
    }

    /// Limit the chunk text sent per analysis call
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Analyze one chunk
    pub async fn analyze(&self, chunk: &DocumentChunk) -> ChunkMapping {
        let text = crate::chunking::truncate(&chunk.text, self.max_chars);
        let text = if text.len() < chunk.text.len() {
            format!("{}...", text)
        } else {
            text.to_string()
        };

        let answer = match ask(&self.oracle, chunk_analysis_prompt(&self.targets, &text)).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Mapping failed for chunk {}: {}", chunk.chunk_id, e);
                return ChunkMapping::empty(chunk.chunk_id);
            }
        };

        match parse_chunk_mapping(chunk.chunk_id, &answer, &self.targets) {
            Ok(mapping) => {
                debug!(
                    "Chunk {} claims {} field(s)",
                    chunk.chunk_id,
                    mapping.identified_fields.len()
                );
                mapping
            }
            Err(e) => {
                warn!("Unparseable mapping for chunk {}: {}", chunk.chunk_id, e);
                ChunkMapping::empty(chunk.chunk_id)
            }
        }
    }

    /// Analyze every chunk, in order
    pub async fn analyze_all(&self, chunks: &[DocumentChunk]) -> Vec<ChunkMapping> {
        let mut mappings = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            mappings.push(self.analyze(chunk).await);
        }
        mappings
    }

    /// Route each target field to its best chunk
    pub fn create_extraction_plan(
        &self,
        mappings: &[ChunkMapping],
        targets: &[FieldName],
    ) -> ExtractionPlan {
        let plan = ExtractionPlan::from_mappings(mappings, targets);
        info!(
            "Extraction plan routes {}/{} field(s) to chunks",
            plan.len(),
            targets.len()
        );
        plan
    }
}
