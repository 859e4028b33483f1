//! Overlapping, boundary-aware document chunking

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{debug, info};
use trialmine_domain::DocumentChunk;

static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*-{3}[ \t]*Page[ \t]+\d+[ \t]*-{3}").expect("static pattern")
});

/// Offsets where a new page begins, from `--- Page N ---` markers
///
/// A marker with nothing but whitespace before it opens the first page and
/// is not a break.
pub fn page_breaks_from_markers(text: &str) -> Vec<usize> {
    PAGE_MARKER
        .find_iter(text)
        .map(|m| m.start())
        .filter(|&offset| !text[..offset].trim().is_empty())
        .collect()
}

/// Splits text into size-bounded chunks that share `overlap` bytes
///
/// Cuts prefer a paragraph break, then a sentence break, within
/// `lookback` bytes of the tentative boundary.
#[derive(Debug, Clone)]
pub struct DocumentChunker {
    target_size: usize,
    overlap: usize,
    lookback: usize,
}

impl DocumentChunker {
    /// Create a chunker; `overlap` must be smaller than `target_size`
    pub fn new(target_size: usize, overlap: usize) -> Result<Self, ExtractorError> {
        if target_size == 0 || overlap >= target_size {
            return Err(ExtractorError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, target_size
            )));
        }
        Ok(Self {
            target_size,
            overlap,
            lookback: 500,
        })
    }

    /// Create a chunker from the extractor configuration
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        Ok(Self::new(config.target_chunk_size, config.chunk_overlap)?
            .with_lookback(config.boundary_lookback))
    }

    /// Set the boundary search window
    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    /// Chunk `text`; `page_breaks` are offsets where pages begin
    pub fn chunk(&self, text: &str, page_breaks: Option<&[usize]>) -> Vec<DocumentChunk> {
        let len = text.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = floor_boundary(text, (start + self.target_size).min(len));
            if end <= start {
                end = ceil_boundary(text, start + 1);
            }
            if end < len {
                end = self.natural_cut(text, start, end);
            }

            let chunk = DocumentChunk {
                chunk_id: chunks.len(),
                text: text[start..end].to_string(),
                start_offset: start,
                end_offset: end,
                page_numbers: pages_for(start, end, page_breaks),
            };
            debug!(
                "Created chunk {}: bytes {}-{}, pages {:?}",
                chunk.chunk_id, start, end, chunk.page_numbers
            );
            chunks.push(chunk);

            if end >= len {
                break;
            }
            let next = ceil_boundary(text, end - self.overlap);
            start = if next > start { next } else { end };
        }

        info!("Split document into {} chunks", chunks.len());
        chunks
    }

    /// Pull `end` back to a paragraph or sentence break when one is near
    ///
    /// A cut is only taken if the next chunk would still start after `start`.
    fn natural_cut(&self, text: &str, start: usize, end: usize) -> usize {
        let window_start = ceil_boundary(text, end.saturating_sub(self.lookback).max(start));
        let window = &text[window_start..end];
        let min_cut = start + self.overlap;

        for separator in ["\n\n", ". "] {
            if let Some(pos) = window.rfind(separator) {
                let cut = window_start + pos + separator.len();
                if cut > min_cut {
                    return cut;
                }
            }
        }
        end
    }
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index.min(text.len())
}

/// Longest prefix of `text` that fits in `max` bytes
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    &text[..floor_boundary(text, max)]
}

fn page_of(offset: usize, breaks: &[usize]) -> u32 {
    1 + breaks.iter().filter(|&&b| b > 0 && b <= offset).count() as u32
}

fn pages_for(start: usize, end: usize, page_breaks: Option<&[usize]>) -> BTreeSet<u32> {
    let breaks = match page_breaks {
        Some(b) if !b.is_empty() => b,
        _ => return BTreeSet::from([1]),
    };
    let first = page_of(start, breaks);
    let last = page_of(end.saturating_sub(1).max(start), breaks);
    (first..=last).collect()
}
