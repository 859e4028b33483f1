//! Command-level operations over documents and checkpoints
//!
//! [`ExtractionService`] is what a front end talks to: it reads files,
//! loads reference records and checkpoints, and hands the actual work to
//! the [`Extractor`], the [`MergeEngine`] and the [`ComparisonEngine`].
//! Setup problems (unreadable document or reference, invalid
//! configuration) are reported before any checkpoint is touched.

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::extractor::Extractor;
use crate::types::{ExtractionOutcome, ExtractionRequest};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use trialmine_domain::traits::{CheckpointStore, FieldOracle, TextExtractor};
use trialmine_domain::{CheckpointSummary, DocumentType, ExtractionCheckpoint, UnifiedRecord};
use trialmine_gatekeeper::Gatekeeper;
use trialmine_reconcile::{ComparisonEngine, MergeEngine, ReferenceRecord, StudyComparison};
use trialmine_store::CheckpointManager;

/// Extract, resume, list, merge, compare and delete
pub struct ExtractionService<O, S, T>
where
    O: FieldOracle,
    S: CheckpointStore,
{
    extractor: Extractor<O, S>,
    text_extractor: T,
    merge_engine: MergeEngine,
}

impl<O, S, T> ExtractionService<O, S, T>
where
    O: FieldOracle + Send + Sync + 'static,
    S: CheckpointStore,
    T: TextExtractor<Error = ExtractorError>,
    O::Error: Display,
    S::Error: Display,
{
    /// Create a service around an extractor
    pub fn new(extractor: Extractor<O, S>, text_extractor: T) -> Self {
        Self {
            extractor,
            text_extractor,
            merge_engine: MergeEngine::new(),
        }
    }

    /// Use a custom merge priority
    pub fn with_merge_engine(mut self, merge_engine: MergeEngine) -> Self {
        self.merge_engine = merge_engine;
        self
    }

    /// The underlying extractor
    pub fn extractor(&self) -> &Extractor<O, S> {
        &self.extractor
    }

    /// Extract one document, optionally comparing against a reference CSV
    pub async fn extract(
        &self,
        case_id: &str,
        document_path: &Path,
        document_type: DocumentType,
        reference_path: Option<&Path>,
    ) -> Result<ExtractionOutcome, ExtractorError> {
        self.extractor
            .config()
            .validate()
            .map_err(ExtractorError::Config)?;

        let text = self.read_document(document_path)?;
        let reference = reference_path
            .map(|path| self.load_reference(path, case_id))
            .transpose()?;

        let mut request = ExtractionRequest::new(
            case_id,
            document_path.display().to_string(),
            document_type,
            text,
        );
        if let Some(reference) = reference {
            request = request.with_reference(reference);
        }
        self.extractor.extract(request).await
    }

    /// Continue an existing checkpoint from its recorded document path
    pub async fn resume(
        &self,
        case_id: &str,
        document_type: DocumentType,
    ) -> Result<ExtractionOutcome, ExtractorError> {
        let checkpoint = self.require_checkpoint(case_id, document_type)?;
        info!(
            "Resuming {} {} from {}",
            case_id, document_type, checkpoint.document_path
        );
        let path = checkpoint.document_path.clone();
        self.extract(case_id, Path::new(&path), document_type, None)
            .await
    }

    /// Summaries of every stored checkpoint
    pub fn list_checkpoints(&self) -> Result<Vec<CheckpointSummary>, ExtractorError> {
        let mut summaries = self
            .extractor
            .store()
            .list()
            .map_err(|e| ExtractorError::Store(e.to_string()))?;
        summaries.sort_by(|a, b| {
            a.case_id
                .cmp(&b.case_id)
                .then(a.document_type.cmp(&b.document_type))
        });
        Ok(summaries)
    }

    /// Load one checkpoint, if it exists
    pub fn checkpoint(
        &self,
        case_id: &str,
        document_type: DocumentType,
    ) -> Result<Option<ExtractionCheckpoint>, ExtractorError> {
        self.extractor
            .store()
            .load(case_id, document_type)
            .map_err(|e| ExtractorError::Store(e.to_string()))
    }

    /// Merge every readable checkpoint of a case into one record
    ///
    /// A checkpoint that cannot be loaded is logged and left out.
    pub fn merge(&self, case_id: &str) -> Result<UnifiedRecord, ExtractorError> {
        let mut checkpoints = BTreeMap::new();
        for document_type in DocumentType::all() {
            match self.checkpoint(case_id, document_type) {
                Ok(Some(checkpoint)) => {
                    checkpoints.insert(document_type, checkpoint);
                }
                Ok(None) => {}
                Err(e) => warn!("Leaving {} {} out of the merge: {}", case_id, document_type, e),
            }
        }
        if checkpoints.is_empty() {
            return Err(ExtractorError::NoCheckpoints(case_id.to_string()));
        }
        Ok(self.merge_checkpoints(case_id, &checkpoints))
    }

    /// Merge checkpoints the caller already holds
    pub fn merge_checkpoints(
        &self,
        case_id: &str,
        checkpoints: &BTreeMap<DocumentType, ExtractionCheckpoint>,
    ) -> UnifiedRecord {
        self.merge_engine.merge(case_id, checkpoints)
    }

    /// Compare a stored checkpoint with its reference record
    pub async fn compare(
        &self,
        case_id: &str,
        document_type: DocumentType,
        reference_path: &Path,
    ) -> Result<StudyComparison, ExtractorError> {
        let reference = self.load_reference(reference_path, case_id)?;
        let checkpoint = self.require_checkpoint(case_id, document_type)?;

        let engine = ComparisonEngine::with_cache(
            Arc::clone(self.extractor.oracle()),
            self.extractor.comparison_cache().clone(),
        );
        tokio::task::spawn_blocking(move || engine.compare_checkpoint(&checkpoint, &reference))
            .await
            .map_err(|e| ExtractorError::Oracle(format!("Task join error: {}", e)))
    }

    /// Remove a checkpoint; returns whether one existed
    pub fn delete(&self, case_id: &str, document_type: DocumentType) -> Result<bool, ExtractorError> {
        self.extractor
            .store()
            .delete(case_id, document_type)
            .map_err(|e| ExtractorError::Store(e.to_string()))
    }

    fn require_checkpoint(
        &self,
        case_id: &str,
        document_type: DocumentType,
    ) -> Result<ExtractionCheckpoint, ExtractorError> {
        self.checkpoint(case_id, document_type)?
            .ok_or_else(|| ExtractorError::NoCheckpoint {
                case_id: case_id.to_string(),
                document_type,
            })
    }

    fn read_document(&self, path: &Path) -> Result<String, ExtractorError> {
        let bytes = std::fs::read(path).map_err(|e| ExtractorError::Document {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.text_extractor.extract(&bytes)
    }

    fn load_reference(&self, path: &Path, case_id: &str) -> Result<ReferenceRecord, ExtractorError> {
        let reference = ReferenceRecord::from_path(path, Some(case_id))?;
        info!(
            "Loaded reference record for {} ({} columns)",
            case_id,
            reference.len()
        );
        Ok(reference)
    }
}

impl<O> ExtractionService<O, CheckpointManager, crate::PlainTextExtractor>
where
    O: FieldOracle + Send + Sync + 'static,
    O::Error: Display,
{
    /// Service over plain-text documents with checkpoints in `checkpoint_dir`
    pub fn with_checkpoint_dir(
        oracle: O,
        checkpoint_dir: impl AsRef<Path>,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        let store = CheckpointManager::new(checkpoint_dir.as_ref())?;
        let extractor = Extractor::new(oracle, store, Gatekeeper::default_config(), config);
        Ok(Self::new(extractor, crate::PlainTextExtractor))
    }
}
