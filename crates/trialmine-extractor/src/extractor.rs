//! Core Extractor implementation

use crate::chunking::{page_breaks_from_markers, truncate, DocumentChunker};
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::filename::FilenameMetadata;
use crate::mapper::ChunkFieldMapper;
use crate::oracle::ask;
use crate::outcome;
use crate::parser::{parse_field_answers, strip_code_fence};
use crate::prompt::field_prompt;
use crate::strategy::{classify, Attempt, Lookup, Strategy};
use crate::types::{ExtractionOutcome, ExtractionRequest};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trialmine_domain::traits::{CheckpointStore, FieldOracle};
use trialmine_domain::{
    is_not_found, ComparisonResult, DocumentChunk, ExtractionCheckpoint, ExtractionPlan,
    ExtractionStatus, FieldExtraction, FieldName, FieldUpdate,
};
use trialmine_gatekeeper::Gatekeeper;
use trialmine_reconcile::{ComparisonCache, ComparisonEngine, ReferenceRecord};
use trialmine_store::compute_fingerprint;

/// Everything one run needs to know about the document being processed
struct RunContext<'a> {
    text: &'a str,
    chunks: Vec<DocumentChunk>,
    plan: ExtractionPlan,
    reference: Option<&'a ReferenceRecord>,
}

#[derive(Default)]
struct RunStats {
    completed: usize,
    comparisons: Vec<ComparisonResult>,
}

/// The Extractor fills a document's checkpoint field by field
///
/// Fields are visited in priority order, batched by co-occurrence group, and
/// tried with each strategy of their chain until the validator accepts a
/// value. Every status change is persisted before the next oracle call.
pub struct Extractor<O, S>
where
    O: FieldOracle,
    S: CheckpointStore,
{
    oracle: Arc<O>,
    store: Arc<S>,
    gatekeeper: Gatekeeper,
    config: ExtractorConfig,
    comparison_cache: ComparisonCache,
}

impl<O, S> Extractor<O, S>
where
    O: FieldOracle + Send + Sync + 'static,
    S: CheckpointStore,
    O::Error: Display,
    S::Error: Display,
{
    /// Create a new Extractor
    pub fn new(oracle: O, store: S, gatekeeper: Gatekeeper, config: ExtractorConfig) -> Self {
        Self::from_shared(Arc::new(oracle), Arc::new(store), gatekeeper, config)
    }

    /// Create an Extractor over an oracle and store shared with other components
    pub fn from_shared(
        oracle: Arc<O>,
        store: Arc<S>,
        gatekeeper: Gatekeeper,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            oracle,
            store,
            gatekeeper,
            config,
            comparison_cache: ComparisonCache::new(),
        }
    }

    /// Share a comparison cache with other engines
    pub fn with_comparison_cache(mut self, cache: ComparisonCache) -> Self {
        self.comparison_cache = cache;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The oracle
    pub fn oracle(&self) -> &Arc<O> {
        &self.oracle
    }

    /// The checkpoint store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Cache used for immediate comparisons
    pub fn comparison_cache(&self) -> &ComparisonCache {
        &self.comparison_cache
    }

    /// Extract every pending field of one document
    ///
    /// Opens (or resumes) the checkpoint for the request's case and document
    /// type and returns it once every attempted field is terminal. Oracle
    /// failures and rejections become FAILED fields; only configuration and
    /// store errors abort the run.
    pub async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionOutcome, ExtractorError> {
        self.config.validate().map_err(ExtractorError::Config)?;
        let chunker = DocumentChunker::from_config(&self.config)?;

        let targets = request
            .target_fields
            .clone()
            .unwrap_or_else(|| FieldName::document_targets(self.config.include_registry_fields));
        let fingerprint = compute_fingerprint(&request.text);

        info!(
            "Starting extraction for {} {} ({} chars, {} target fields)",
            request.case_id,
            request.document_type,
            request.text.len(),
            targets.len()
        );

        let (mut checkpoint, resumed) = self.open_checkpoint(&request, &targets, &fingerprint)?;

        if self.config.use_filename_side_channel {
            self.apply_filename_side_channel(&mut checkpoint, &request.document_path)?;
        }

        let work = self.work_list(&checkpoint, &targets);
        if work.is_empty() {
            info!("Nothing left to extract for {} {}", request.case_id, request.document_type);
            return Ok(ExtractionOutcome {
                checkpoint,
                resumed,
                fields_attempted: 0,
                fields_completed: 0,
                comparisons: Vec::new(),
            });
        }

        let breaks = page_breaks_from_markers(&request.text);
        let chunks = chunker.chunk(&request.text, (!breaks.is_empty()).then_some(&breaks[..]));

        let plan = self.plan(&chunks, &work).await;
        let ctx = RunContext {
            text: &request.text,
            chunks,
            plan,
            reference: request.reference.as_ref(),
        };

        let mut stats = RunStats::default();
        for batch in batches(&work) {
            self.run_batch(&mut checkpoint, &batch, &ctx, &mut stats).await?;
        }

        info!(
            "Finished {} {}: {} completed, {} failed, {} skipped of {} ({:.0}%)",
            checkpoint.case_id,
            checkpoint.document_type,
            checkpoint.completed_fields,
            checkpoint.failed_fields,
            checkpoint.skipped_fields,
            checkpoint.total_fields,
            checkpoint.progress_percentage()
        );

        Ok(ExtractionOutcome {
            checkpoint,
            resumed,
            fields_attempted: work.len(),
            fields_completed: stats.completed,
            comparisons: stats.comparisons,
        })
    }

    /// Load the existing checkpoint when it still matches the text, else start over
    fn open_checkpoint(
        &self,
        request: &ExtractionRequest,
        targets: &[FieldName],
        fingerprint: &str,
    ) -> Result<(ExtractionCheckpoint, bool), ExtractorError> {
        let existing = self
            .store
            .load_valid(&request.case_id, request.document_type, fingerprint)
            .map_err(|e| ExtractorError::Store(e.to_string()))?;

        let mut checkpoint = match existing {
            Some(mut checkpoint) => {
                for field in targets {
                    checkpoint
                        .fields
                        .entry(*field)
                        .or_insert_with(|| FieldExtraction::pending(*field));
                }
                checkpoint.refresh_counters();
                checkpoint.document_path = request.document_path.clone();

                let reset = checkpoint.reset_interrupted();
                if reset > 0 {
                    info!("Reset {} interrupted field(s) to pending", reset);
                }
                info!(
                    "Resuming {} {} at {:.0}%",
                    checkpoint.case_id,
                    checkpoint.document_type,
                    checkpoint.progress_percentage()
                );
                self.save(&mut checkpoint)?;
                return Ok((checkpoint, true));
            }
            None => self.fresh_checkpoint(request, targets, fingerprint),
        };

        self.save(&mut checkpoint)?;
        Ok((checkpoint, false))
    }

    fn fresh_checkpoint(
        &self,
        request: &ExtractionRequest,
        targets: &[FieldName],
        fingerprint: &str,
    ) -> ExtractionCheckpoint {
        info!(
            "Creating checkpoint for {} {} with {} field(s)",
            request.case_id,
            request.document_type,
            targets.len()
        );
        ExtractionCheckpoint::new(
            request.case_id.clone(),
            request.document_path.clone(),
            request.document_type,
            targets,
            fingerprint,
        )
    }

    /// Fill the trial identifier from the file name without asking the oracle
    fn apply_filename_side_channel(
        &self,
        checkpoint: &mut ExtractionCheckpoint,
        document_path: &str,
    ) -> Result<(), ExtractorError> {
        let pending = checkpoint
            .field(FieldName::NctNumber)
            .is_some_and(|f| f.status == ExtractionStatus::Pending);
        if !pending {
            return Ok(());
        }
        let Some(case_id) = FilenameMetadata::from_path(document_path).case_id else {
            return Ok(());
        };

        info!("Taking {} from file name", case_id);
        let update = FieldUpdate::skipped(case_id)
            .with_confidence(1.0)
            .with_source(format!("filename: {}", FilenameMetadata::label(document_path)));
        self.transition(checkpoint, FieldName::NctNumber, update)
    }

    /// Fields to attempt this run, in priority order
    fn work_list(&self, checkpoint: &ExtractionCheckpoint, targets: &[FieldName]) -> Vec<FieldName> {
        FieldName::extraction_order()
            .into_iter()
            .filter(|f| targets.contains(f))
            .filter(|f| match checkpoint.field(*f).map(|e| e.status) {
                Some(ExtractionStatus::Pending) => true,
                Some(ExtractionStatus::Failed) => self.config.retry_failed,
                _ => false,
            })
            .collect()
    }

    /// Route non-outcome fields to chunks, when mapping is worthwhile
    async fn plan(&self, chunks: &[DocumentChunk], work: &[FieldName]) -> ExtractionPlan {
        let routable: Vec<FieldName> = work.iter().copied().filter(|f| !f.is_outcome()).collect();
        if !self.config.use_chunk_mapping || chunks.len() < 2 || routable.is_empty() {
            return ExtractionPlan::default();
        }

        let mapper = ChunkFieldMapper::new(Arc::clone(&self.oracle), routable.clone())
            .with_max_chars(self.config.mapper_chunk_chars);
        let mappings = mapper.analyze_all(chunks).await;
        mapper.create_extraction_plan(&mappings, &routable)
    }

    async fn run_batch(
        &self,
        checkpoint: &mut ExtractionCheckpoint,
        batch: &[FieldName],
        ctx: &RunContext<'_>,
        stats: &mut RunStats,
    ) -> Result<(), ExtractorError> {
        let Some(first) = batch.first().copied() else {
            return Ok(());
        };
        debug!("Extracting batch {:?}", batch);

        for field in batch {
            self.transition(checkpoint, *field, FieldUpdate::in_progress())?;
        }

        let mut open: Vec<FieldName> = batch.to_vec();
        let mut attempts: BTreeMap<FieldName, Vec<Attempt>> = BTreeMap::new();

        for strategy in Strategy::chain_for(first) {
            if open.is_empty() {
                break;
            }
            let previous = attempts.get(&first).and_then(|a| a.last());
            if !strategy.runs_after(previous) {
                continue;
            }

            for (field, lookup, source) in self.lookup(*strategy, &open, ctx).await {
                let value = match lookup {
                    Lookup::Value(value) => value,
                    Lookup::Failed(attempt) => {
                        debug!("{} via {}: {:?}", field, source, attempt);
                        attempts.entry(field).or_default().push(attempt);
                        continue;
                    }
                };

                let verdict = self.gatekeeper.validate(field, Some(&value), ctx.text);
                if !verdict.is_accepted() {
                    let reason = verdict.reason().unwrap_or_else(|| "rejected".to_string());
                    warn!("Rejected {} from {}: {}", field, source, reason);
                    attempts.entry(field).or_default().push(Attempt::Rejected(reason));
                    continue;
                }

                let update = FieldUpdate::completed(value.clone())
                    .with_confidence(verdict.match_ratio)
                    .with_source(source.clone());
                self.transition(checkpoint, field, update)?;
                open.retain(|f| *f != field);
                stats.completed += 1;
                info!("Extracted {} from {}", field, source);

                if let Some(reference) = ctx.reference {
                    if let Some(result) = self.compare_now(field, &value, reference).await {
                        stats.comparisons.push(result);
                    }
                }
            }
        }

        for field in open {
            let tried = attempts.remove(&field).unwrap_or_default();
            let (kind, message) = classify(&tried);
            warn!("Could not extract {}: {}", field, message);
            self.transition(checkpoint, field, FieldUpdate::failed(kind, message))?;
        }
        Ok(())
    }

    /// Run one strategy for the open fields of a batch
    ///
    /// Fields the strategy does not apply to (no planned chunk) are left out
    /// of the result and count as untried.
    async fn lookup(
        &self,
        strategy: Strategy,
        open: &[FieldName],
        ctx: &RunContext<'_>,
    ) -> Vec<(FieldName, Lookup, String)> {
        match strategy {
            Strategy::PlannedChunk => {
                let mut by_chunk: BTreeMap<usize, Vec<FieldName>> = BTreeMap::new();
                for field in open {
                    if let Some(chunk_id) = ctx.plan.get(*field) {
                        by_chunk.entry(chunk_id).or_default().push(*field);
                    }
                }

                let mut lookups = Vec::new();
                for (chunk_id, fields) in by_chunk {
                    let Some(chunk) = ctx.chunks.iter().find(|c| c.chunk_id == chunk_id) else {
                        continue;
                    };
                    let label = chunk.label();
                    for (field, lookup) in self.query_fields(&fields, &chunk.text).await {
                        lookups.push((field, lookup, label.clone()));
                    }
                }
                lookups
            }
            Strategy::FullDocument => self
                .query_fields(open, ctx.text)
                .await
                .into_iter()
                .map(|(field, lookup)| (field, lookup, strategy.source_label().to_string()))
                .collect(),
            Strategy::StructuredOutcomes => {
                let mut lookups = Vec::new();
                for field in open {
                    let lookup =
                        outcome::structured(&self.oracle, *field, ctx.text, self.config.outcome_chars)
                            .await;
                    lookups.push((*field, lookup, strategy.source_label().to_string()));
                }
                lookups
            }
            Strategy::CountThenItemize => {
                let mut lookups = Vec::new();
                for field in open {
                    let lookup = outcome::count_then_itemize(
                        &self.oracle,
                        *field,
                        ctx.text,
                        self.config.outcome_fallback_chars,
                        self.config.max_outcome_items,
                    )
                    .await;
                    lookups.push((*field, lookup, strategy.source_label().to_string()));
                }
                lookups
            }
        }
    }

    /// One field prompt for `fields` over `text`
    async fn query_fields(&self, fields: &[FieldName], text: &str) -> Vec<(FieldName, Lookup)> {
        let prompt = field_prompt(fields, truncate(text, self.config.max_field_chars));
        let answer = match ask(&self.oracle, prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                return fields
                    .iter()
                    .map(|f| (*f, Lookup::Failed(Attempt::OracleError(e.clone()))))
                    .collect();
            }
        };

        if is_not_found(strip_code_fence(&answer)) {
            return fields
                .iter()
                .map(|f| (*f, Lookup::Failed(Attempt::NotFound)))
                .collect();
        }

        let mut answers = parse_field_answers(&answer, fields);
        fields
            .iter()
            .map(|f| {
                let lookup = match answers.remove(f) {
                    Some(Some(value)) => Lookup::Value(value),
                    Some(None) => Lookup::Failed(Attempt::NotFound),
                    None => Lookup::Failed(Attempt::Unparseable(format!(
                        "no `{}: value` line in answer",
                        f
                    ))),
                };
                (*f, lookup)
            })
            .collect()
    }

    /// Compare a freshly completed value with the reference record
    async fn compare_now(
        &self,
        field: FieldName,
        value: &str,
        reference: &ReferenceRecord,
    ) -> Option<ComparisonResult> {
        let expected = reference.value_for(field)?.to_string();
        let engine =
            ComparisonEngine::with_cache(Arc::clone(&self.oracle), self.comparison_cache.clone());
        let extracted = value.to_string();

        let result =
            match tokio::task::spawn_blocking(move || engine.compare_field(field, &extracted, &expected))
                .await
            {
                Ok(result) => result,
                Err(e) => {
                    warn!("Comparison task for {} failed: {}", field, e);
                    return None;
                }
            };

        if result.is_match {
            info!("MATCH {} ({:.2}): {}", field, result.similarity_score, result.notes);
        } else {
            warn!(
                "MISMATCH {}: extracted '{}' vs reference '{}' ({})",
                field, result.extracted_value, result.reference_value, result.notes
            );
        }
        Some(result)
    }

    /// Apply a field update and persist it immediately
    fn transition(
        &self,
        checkpoint: &mut ExtractionCheckpoint,
        field: FieldName,
        update: FieldUpdate,
    ) -> Result<(), ExtractorError> {
        debug!("{} {}: -> {}", checkpoint.document_type, field, update.status);
        self.store
            .update_field(checkpoint, field, update)
            .map_err(|e| ExtractorError::Store(e.to_string()))
    }

    fn save(&self, checkpoint: &mut ExtractionCheckpoint) -> Result<(), ExtractorError> {
        self.store
            .save(checkpoint)
            .map_err(|e| ExtractorError::Store(e.to_string()))
    }
}

/// Split the work list into oracle batches
///
/// Outcome fields always travel alone. Other fields are batched with the
/// members of their co-occurrence group that are also on the work list.
fn batches(work: &[FieldName]) -> Vec<Vec<FieldName>> {
    let mut visited = BTreeSet::new();
    let mut batches = Vec::new();

    for field in work {
        if visited.contains(field) {
            continue;
        }
        let batch: Vec<FieldName> = match field.group() {
            Some(group) if !field.is_outcome() => group
                .iter()
                .copied()
                .filter(|f| work.contains(f) && !f.is_outcome() && !visited.contains(f))
                .collect(),
            _ => vec![*field],
        };
        visited.extend(batch.iter().copied());
        batches.push(batch);
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_follow_groups() {
        let work = vec![
            FieldName::NctNumber,
            FieldName::StudyTitle,
            FieldName::BriefSummary,
            FieldName::PrimaryOutcomeMeasures,
            FieldName::Enrollment,
            FieldName::Sex,
            FieldName::Acronym,
        ];
        let batches = batches(&work);
        assert_eq!(
            batches,
            vec![
                vec![FieldName::NctNumber, FieldName::StudyTitle, FieldName::Acronym],
                vec![FieldName::BriefSummary],
                vec![FieldName::PrimaryOutcomeMeasures],
                vec![FieldName::Enrollment, FieldName::Sex],
            ]
        );
    }

    #[test]
    fn test_batches_cover_work_once() {
        let work = FieldName::document_targets(true);
        let flat: Vec<FieldName> = batches(&work).into_iter().flatten().collect();
        assert_eq!(flat.len(), work.len());
        let unique: BTreeSet<_> = flat.iter().collect();
        assert_eq!(unique.len(), work.len());
    }
}
