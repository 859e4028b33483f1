//! Document chunks, per-chunk field mappings, and the resulting extraction plan

use crate::FieldName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A bounded, possibly overlapping slice of a source document
///
/// Offsets are byte offsets into the source text and always fall on
/// character boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Sequence number within the document
    pub chunk_id: usize,
    /// Chunk text
    pub text: String,
    /// Start offset (inclusive)
    pub start_offset: usize,
    /// End offset (exclusive)
    pub end_offset: usize,
    /// Pages the chunk touches, ascending
    pub page_numbers: BTreeSet<u32>,
}

impl DocumentChunk {
    /// Length of the chunk in bytes
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// Whether the chunk is empty
    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }

    /// Short provenance label, e.g. "chunk 3 (pages 4-5)"
    pub fn label(&self) -> String {
        match (self.page_numbers.first(), self.page_numbers.last()) {
            (Some(first), Some(last)) if first != last => {
                format!("chunk {} (pages {}-{})", self.chunk_id, first, last)
            }
            (Some(first), _) => format!("chunk {} (page {})", self.chunk_id, first),
            _ => format!("chunk {}", self.chunk_id),
        }
    }
}

/// Which target fields a chunk plausibly contains
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMapping {
    /// Chunk this mapping describes
    pub chunk_id: usize,
    /// Fields the oracle says are present
    pub identified_fields: BTreeSet<FieldName>,
    /// Confidence per identified field, 0.0-1.0
    pub confidence_scores: BTreeMap<FieldName, f64>,
    /// Section headings the oracle noticed
    pub relevant_sections: Vec<String>,
}

impl ChunkMapping {
    /// A degraded mapping that claims nothing
    pub fn empty(chunk_id: usize) -> Self {
        Self {
            chunk_id,
            ..Default::default()
        }
    }

    /// Confidence that this chunk contains `field`, zero when not identified
    pub fn confidence_for(&self, field: FieldName) -> f64 {
        if !self.identified_fields.contains(&field) {
            return 0.0;
        }
        self.confidence_scores.get(&field).copied().unwrap_or(0.0)
    }
}

/// Field to best-chunk routing table
///
/// A field absent from the plan was claimed by no chunk and needs a
/// full-document query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionPlan {
    assignments: BTreeMap<FieldName, usize>,
}

impl ExtractionPlan {
    /// Pick, per target field, the chunk with the highest positive confidence
    ///
    /// Ties go to the earlier chunk.
    pub fn from_mappings(mappings: &[ChunkMapping], target_fields: &[FieldName]) -> Self {
        let mut ordered: Vec<&ChunkMapping> = mappings.iter().collect();
        ordered.sort_by_key(|m| m.chunk_id);

        let mut assignments = BTreeMap::new();
        for field in target_fields {
            let mut best: Option<(usize, f64)> = None;
            for mapping in &ordered {
                let confidence = mapping.confidence_for(*field);
                if confidence <= 0.0 {
                    continue;
                }
                match best {
                    Some((_, current)) if confidence <= current => {}
                    _ => best = Some((mapping.chunk_id, confidence)),
                }
            }
            if let Some((chunk_id, _)) = best {
                assignments.insert(*field, chunk_id);
            }
        }

        Self { assignments }
    }

    /// Chunk nominated for `field`
    pub fn get(&self, field: FieldName) -> Option<usize> {
        self.assignments.get(&field).copied()
    }

    /// Number of routed fields
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether no field was routed
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Iterate over (field, chunk) pairs
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, usize)> + '_ {
        self.assignments.iter().map(|(f, c)| (*f, *c))
    }
}
