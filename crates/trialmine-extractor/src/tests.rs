//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{
        ExtractionRequest, ExtractionService, Extractor, ExtractorConfig, ExtractorError,
        PlainTextExtractor,
    };
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use trialmine_domain::traits::CheckpointStore;
    use trialmine_domain::{
        CheckpointSummary, DocumentType, ExtractionCheckpoint, ExtractionStatus, FailureKind,
        FieldName, FieldUpdate,
    };
    use trialmine_gatekeeper::Gatekeeper;
    use trialmine_llm::MockOracle;
    use trialmine_reconcile::ReferenceRecord;
    use trialmine_store::{compute_fingerprint, CheckpointManager, StoreError};

    const CASE: &str = "NCT01234567";

    const PROTOCOL: &str = "\
--- Page 1 ---
A Randomized Study of Drug X in Asthma (ASTHMA-1)
ClinicalTrials.gov Identifier: NCT01234567
Sponsor: Acme Corp

--- Page 2 ---
Planned enrollment is 120 participants.
Primary outcome: Change in FEV1 at Week 12.
";

    fn extractor(oracle: &MockOracle, dir: &TempDir) -> Extractor<MockOracle, CheckpointManager> {
        extractor_with(oracle, dir, ExtractorConfig::default())
    }

    fn extractor_with(
        oracle: &MockOracle,
        dir: &TempDir,
        config: ExtractorConfig,
    ) -> Extractor<MockOracle, CheckpointManager> {
        let store = CheckpointManager::new(dir.path()).unwrap();
        Extractor::new(oracle.clone(), store, Gatekeeper::default_config(), config)
    }

    fn request(fields: &[FieldName]) -> ExtractionRequest {
        ExtractionRequest::new(CASE, "protocol.txt", DocumentType::Protocol, PROTOCOL)
            .with_fields(fields.to_vec())
    }

    fn status(checkpoint: &ExtractionCheckpoint, field: FieldName) -> ExtractionStatus {
        checkpoint.field(field).unwrap().status
    }

    #[tokio::test]
    async fn test_failing_oracle_yields_complete_checkpoint() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::failing();
        let fields = [
            FieldName::Sponsor,
            FieldName::Enrollment,
            FieldName::Conditions,
            FieldName::StudyTitle,
            FieldName::Phases,
        ];

        let outcome = extractor(&oracle, &dir).extract(request(&fields)).await.unwrap();
        let checkpoint = &outcome.checkpoint;

        assert_eq!(checkpoint.total_fields, 5);
        assert_eq!(checkpoint.failed_fields, 5);
        assert_eq!(checkpoint.completed_fields, 0);
        assert!(checkpoint.is_complete());
        for field in fields {
            let entry = checkpoint.field(field).unwrap();
            assert_eq!(entry.failure_kind, Some(FailureKind::OracleError));
            assert!(entry.error_message.is_some());
        }

        // The persisted file says the same
        let store = CheckpointManager::new(dir.path()).unwrap();
        let saved = store.load(CASE, DocumentType::Protocol).unwrap().unwrap();
        assert_eq!(saved.failed_fields, 5);
    }

    #[tokio::test]
    async fn test_single_field_completed() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::default();
        oracle.add_response("FIELD TO EXTRACT: sponsor", "sponsor: Acme Corp");

        let outcome = extractor(&oracle, &dir)
            .extract(request(&[FieldName::Sponsor]))
            .await
            .unwrap();

        let entry = outcome.checkpoint.field(FieldName::Sponsor).unwrap();
        assert_eq!(entry.status, ExtractionStatus::Completed);
        assert_eq!(entry.value.as_deref(), Some("Acme Corp"));
        assert_eq!(entry.source_text.as_deref(), Some("full document"));
        assert_eq!(entry.confidence, Some(1.0));
        assert_eq!(outcome.fields_attempted, 1);
        assert_eq!(outcome.fields_completed, 1);
        assert!(!outcome.resumed);
    }

    #[tokio::test]
    async fn test_registry_phase_spelling_completes() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::new("phases: PHASE2");
        let text = "--- Page 1 ---\nThis is a Phase 2, randomized trial of Drug X in asthma.\n";
        let request = ExtractionRequest::new(CASE, "protocol.txt", DocumentType::Protocol, text)
            .with_fields(vec![FieldName::Phases]);

        let outcome = extractor(&oracle, &dir).extract(request).await.unwrap();

        let entry = outcome.checkpoint.field(FieldName::Phases).unwrap();
        assert_eq!(entry.status, ExtractionStatus::Completed);
        assert_eq!(entry.value.as_deref(), Some("PHASE2"));
        assert!(oracle.prompts()[0].contains("as written in the document"));
    }

    #[tokio::test]
    async fn test_group_is_one_oracle_call() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::default();
        oracle.add_response(
            "FIELDS TO EXTRACT",
            "enrollment: 120\nsex: All\nage: Adult, Older Adult",
        );

        let outcome = extractor(&oracle, &dir)
            .extract(request(&[FieldName::Enrollment, FieldName::Sex, FieldName::Age]))
            .await
            .unwrap();

        assert_eq!(oracle.calls_containing("FIELDS TO EXTRACT"), 1);
        assert_eq!(outcome.checkpoint.completed_fields, 3);
        assert_eq!(
            outcome.checkpoint.resolved_value(FieldName::Enrollment),
            Some("120")
        );
    }

    #[tokio::test]
    async fn test_fabricated_value_is_rejected() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::new("sponsor: Globex Pharmaceuticals");

        let outcome = extractor(&oracle, &dir)
            .extract(request(&[FieldName::Sponsor]))
            .await
            .unwrap();

        let entry = outcome.checkpoint.field(FieldName::Sponsor).unwrap();
        assert_eq!(entry.status, ExtractionStatus::Failed);
        assert_eq!(entry.failure_kind, Some(FailureKind::Rejected));
        assert!(entry.value.is_none());
    }

    #[tokio::test]
    async fn test_memorized_identifier_is_rejected() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::new("nct_number: NCT07654321");
        let config = ExtractorConfig {
            use_filename_side_channel: false,
            ..ExtractorConfig::default()
        };

        let outcome = extractor_with(&oracle, &dir, config)
            .extract(request(&[FieldName::NctNumber]))
            .await
            .unwrap();

        let entry = outcome.checkpoint.field(FieldName::NctNumber).unwrap();
        assert_eq!(entry.failure_kind, Some(FailureKind::Rejected));
    }

    #[tokio::test]
    async fn test_not_found_is_its_own_failure_kind() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::default();

        let outcome = extractor(&oracle, &dir)
            .extract(request(&[FieldName::Collaborators]))
            .await
            .unwrap();

        let entry = outcome.checkpoint.field(FieldName::Collaborators).unwrap();
        assert_eq!(entry.failure_kind, Some(FailureKind::NotFound));
        assert_eq!(entry.error_message.as_deref(), Some("not found in document"));
    }

    #[tokio::test]
    async fn test_identifier_from_filename_skips_the_oracle() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::default();
        let request = ExtractionRequest::new(
            CASE,
            "/data/NCT01234567_Prot_000.txt",
            DocumentType::Protocol,
            PROTOCOL,
        )
        .with_fields(vec![FieldName::NctNumber, FieldName::Sponsor]);

        let outcome = extractor(&oracle, &dir).extract(request).await.unwrap();
        let entry = outcome.checkpoint.field(FieldName::NctNumber).unwrap();

        assert_eq!(entry.status, ExtractionStatus::Skipped);
        assert_eq!(entry.value.as_deref(), Some("NCT01234567"));
        assert_eq!(entry.confidence, Some(1.0));
        assert_eq!(
            entry.source_text.as_deref(),
            Some("filename: NCT01234567_Prot_000.txt")
        );
        assert_eq!(oracle.calls_containing("nct_number"), 0);
        assert_eq!(outcome.checkpoint.skipped_fields, 1);
        assert!(outcome.checkpoint.is_complete());
    }

    #[tokio::test]
    async fn test_resume_retries_failed_fields_only() {
        let dir = TempDir::new().unwrap();
        let first = MockOracle::default();
        first.add_response("FIELD TO EXTRACT: sponsor", "sponsor: Acme Corp");
        let fields = [FieldName::Sponsor, FieldName::Enrollment];

        let outcome = extractor(&first, &dir).extract(request(&fields)).await.unwrap();
        assert_eq!(status(&outcome.checkpoint, FieldName::Enrollment), ExtractionStatus::Failed);

        let second = MockOracle::default();
        second.add_response("FIELD TO EXTRACT: enrollment", "enrollment: 120");
        let outcome = extractor(&second, &dir).extract(request(&fields)).await.unwrap();

        assert!(outcome.resumed);
        assert_eq!(outcome.fields_attempted, 1);
        assert_eq!(second.calls_containing("FIELD TO EXTRACT: sponsor"), 0);
        assert_eq!(status(&outcome.checkpoint, FieldName::Enrollment), ExtractionStatus::Completed);
        assert_eq!(outcome.checkpoint.resolved_value(FieldName::Sponsor), Some("Acme Corp"));
    }

    #[tokio::test]
    async fn test_resume_without_retry_leaves_failures() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::default();
        let config = ExtractorConfig {
            retry_failed: false,
            ..ExtractorConfig::default()
        };
        let extractor = extractor_with(&oracle, &dir, config);

        extractor.extract(request(&[FieldName::Sponsor])).await.unwrap();
        oracle.reset_call_count();
        let outcome = extractor.extract(request(&[FieldName::Sponsor])).await.unwrap();

        assert_eq!(oracle.call_count(), 0);
        assert_eq!(outcome.fields_attempted, 0);
        assert_eq!(status(&outcome.checkpoint, FieldName::Sponsor), ExtractionStatus::Failed);
    }

    #[tokio::test]
    async fn test_interrupted_field_is_retried() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointManager::new(dir.path()).unwrap();
        let mut stuck = ExtractionCheckpoint::new(
            CASE,
            "protocol.txt",
            DocumentType::Protocol,
            &[FieldName::Sponsor],
            compute_fingerprint(PROTOCOL),
        );
        stuck.apply(FieldName::Sponsor, FieldUpdate::in_progress()).unwrap();
        store.save(&mut stuck).unwrap();

        let oracle = MockOracle::new("sponsor: Acme Corp");
        let outcome = extractor(&oracle, &dir)
            .extract(request(&[FieldName::Sponsor]))
            .await
            .unwrap();

        assert!(outcome.resumed);
        assert_eq!(status(&outcome.checkpoint, FieldName::Sponsor), ExtractionStatus::Completed);
    }

    #[tokio::test]
    async fn test_changed_text_discards_progress() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::new("sponsor: Acme Corp");
        extractor(&oracle, &dir)
            .extract(request(&[FieldName::Sponsor]))
            .await
            .unwrap();

        let amended = format!("{}\nAmendment 2: sponsor transferred.\n", PROTOCOL);
        let failing = MockOracle::failing();
        let outcome = extractor(&failing, &dir)
            .extract(
                ExtractionRequest::new(CASE, "protocol.txt", DocumentType::Protocol, amended)
                    .with_fields(vec![FieldName::Sponsor]),
            )
            .await
            .unwrap();

        assert!(!outcome.resumed);
        assert_eq!(failing.call_count(), 1);
        assert_eq!(status(&outcome.checkpoint, FieldName::Sponsor), ExtractionStatus::Failed);
        assert!(outcome.checkpoint.resolved_value(FieldName::Sponsor).is_none());
    }

    #[tokio::test]
    async fn test_corrupt_checkpoint_starts_over() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointManager::new(dir.path()).unwrap();
        std::fs::write(store.path_for(CASE, DocumentType::Protocol), "{ not json").unwrap();

        let oracle = MockOracle::new("sponsor: Acme Corp");
        let outcome = extractor(&oracle, &dir)
            .extract(request(&[FieldName::Sponsor]))
            .await
            .unwrap();

        assert!(!outcome.resumed);
        assert_eq!(outcome.checkpoint.completed_fields, 1);
    }

    /// Store that records every field update it is asked to persist
    struct RecordingStore {
        inner: CheckpointManager,
        updates: Mutex<Vec<(FieldName, ExtractionStatus)>>,
    }

    impl CheckpointStore for RecordingStore {
        type Error = StoreError;

        fn save(&self, checkpoint: &mut ExtractionCheckpoint) -> Result<(), StoreError> {
            self.inner.save(checkpoint)
        }

        fn load(
            &self,
            case_id: &str,
            document_type: DocumentType,
        ) -> Result<Option<ExtractionCheckpoint>, StoreError> {
            self.inner.load(case_id, document_type)
        }

        fn load_valid(
            &self,
            case_id: &str,
            document_type: DocumentType,
            fingerprint: &str,
        ) -> Result<Option<ExtractionCheckpoint>, StoreError> {
            self.inner.load_valid(case_id, document_type, fingerprint)
        }

        fn update_field(
            &self,
            checkpoint: &mut ExtractionCheckpoint,
            field: FieldName,
            update: FieldUpdate,
        ) -> Result<(), StoreError> {
            self.updates.lock().unwrap().push((field, update.status));
            CheckpointStore::update_field(&self.inner, checkpoint, field, update)
        }

        fn delete(&self, case_id: &str, document_type: DocumentType) -> Result<bool, StoreError> {
            self.inner.delete(case_id, document_type)
        }

        fn list(&self) -> Result<Vec<CheckpointSummary>, StoreError> {
            self.inner.list()
        }
    }

    #[tokio::test]
    async fn test_field_transitions_go_through_store() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore {
            inner: CheckpointManager::new(dir.path()).unwrap(),
            updates: Mutex::new(Vec::new()),
        };
        let oracle = MockOracle::new("sponsor: Acme Corp");
        let extractor = Extractor::new(
            oracle,
            store,
            Gatekeeper::default_config(),
            ExtractorConfig::default(),
        );

        let outcome = extractor.extract(request(&[FieldName::Sponsor])).await.unwrap();
        assert_eq!(outcome.checkpoint.completed_fields, 1);
        assert_eq!(
            *extractor.store().updates.lock().unwrap(),
            vec![
                (FieldName::Sponsor, ExtractionStatus::InProgress),
                (FieldName::Sponsor, ExtractionStatus::Completed),
            ]
        );

        let on_disk = extractor
            .store()
            .load(CASE, DocumentType::Protocol)
            .unwrap()
            .unwrap();
        assert_eq!(status(&on_disk, FieldName::Sponsor), ExtractionStatus::Completed);
    }

    #[tokio::test]
    async fn test_planned_chunk_is_asked_first() {
        let dir = TempDir::new().unwrap();
        let mut text: String = (0..10)
            .map(|i| format!("Background paragraph {} describes the disease area in general terms.\n\n", i))
            .collect();
        text.push_str("Planned enrollment is 120 participants.\n");

        let oracle = MockOracle::new("{\"fields\": [], \"confidence\": {}}");
        oracle.add_response("FIELD TO EXTRACT: enrollment", "enrollment: 120");
        oracle.add_response(
            "enrollment is 120",
            "{\"fields\": [\"enrollment\"], \"confidence\": {\"enrollment\": 0.9}}",
        );
        let config = ExtractorConfig {
            target_chunk_size: 200,
            chunk_overlap: 20,
            boundary_lookback: 50,
            ..ExtractorConfig::default()
        };

        let outcome = extractor_with(&oracle, &dir, config)
            .extract(
                ExtractionRequest::new(CASE, "protocol.txt", DocumentType::Protocol, text)
                    .with_fields(vec![FieldName::Enrollment]),
            )
            .await
            .unwrap();

        assert!(oracle.calls_containing("CHUNK ANALYSIS") > 1);
        assert_eq!(oracle.calls_containing("FIELD TO EXTRACT: enrollment"), 1);
        let entry = outcome.checkpoint.field(FieldName::Enrollment).unwrap();
        assert_eq!(entry.status, ExtractionStatus::Completed);
        assert!(entry.source_text.as_deref().unwrap().starts_with("chunk "));
    }

    #[tokio::test]
    async fn test_chunk_miss_falls_back_to_full_document() {
        let dir = TempDir::new().unwrap();
        let text: String = (0..10)
            .map(|i| format!("Paragraph {} mentions Acme Corp as the sponsor of record.\n\n", i))
            .collect();

        let oracle = MockOracle::new("{\"fields\": [\"sponsor\"], \"confidence\": {\"sponsor\": 0.8}}");
        // Chunk-scoped answers fail, the full-document answer succeeds
        oracle.add_response("Paragraph 9 mentions", "sponsor: Acme Corp");
        oracle.add_response("FIELD TO EXTRACT: sponsor", "NOT_FOUND");
        let config = ExtractorConfig {
            target_chunk_size: 200,
            chunk_overlap: 20,
            max_field_chars: 100_000,
            ..ExtractorConfig::default()
        };

        let outcome = extractor_with(&oracle, &dir, config)
            .extract(
                ExtractionRequest::new(CASE, "protocol.txt", DocumentType::Protocol, text)
                    .with_fields(vec![FieldName::Sponsor]),
            )
            .await
            .unwrap();

        let entry = outcome.checkpoint.field(FieldName::Sponsor).unwrap();
        assert_eq!(entry.status, ExtractionStatus::Completed);
        assert_eq!(entry.source_text.as_deref(), Some("full document"));
        assert_eq!(oracle.calls_containing("FIELD TO EXTRACT: sponsor"), 2);
    }

    #[tokio::test]
    async fn test_structured_outcomes() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::default();
        oracle.add_response(
            "OUTCOME EXTRACTION",
            "```json\n[{\"outcome_measure\": \"Change in FEV1\", \"outcome_time_frame\": \"Week 12\"}]\n```",
        );

        let outcome = extractor(&oracle, &dir)
            .extract(request(&[FieldName::PrimaryOutcomeMeasures]))
            .await
            .unwrap();

        let entry = outcome.checkpoint.field(FieldName::PrimaryOutcomeMeasures).unwrap();
        assert_eq!(entry.status, ExtractionStatus::Completed);
        assert_eq!(entry.value.as_deref(), Some("Change in FEV1 [Time Frame: Week 12]"));
        assert_eq!(entry.source_text.as_deref(), Some("structured outcome query"));
        assert_eq!(oracle.calls_containing("OUTCOME COUNT"), 0);
    }

    #[tokio::test]
    async fn test_unparseable_outcomes_fall_back_to_counting() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::default();
        oracle.add_response("OUTCOME EXTRACTION", "The primary outcome is FEV1, I think.");
        oracle.add_response("OUTCOME COUNT", "1");
        oracle.add_response("OUTCOME ITEM #1", "Change in FEV1");
        oracle.add_response("OUTCOME TIMEFRAME", "Week 12");

        let outcome = extractor(&oracle, &dir)
            .extract(request(&[FieldName::PrimaryOutcomeMeasures]))
            .await
            .unwrap();

        let entry = outcome.checkpoint.field(FieldName::PrimaryOutcomeMeasures).unwrap();
        assert_eq!(entry.status, ExtractionStatus::Completed);
        assert_eq!(entry.value.as_deref(), Some("Change in FEV1 [Time Frame: Week 12]"));
        assert_eq!(entry.source_text.as_deref(), Some("outcome count-then-itemize"));
    }

    #[tokio::test]
    async fn test_empty_outcome_list_does_not_count() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::new("[]");

        let outcome = extractor(&oracle, &dir)
            .extract(request(&[FieldName::OtherOutcomeMeasures]))
            .await
            .unwrap();

        assert_eq!(oracle.calls_containing("OUTCOME COUNT"), 0);
        let entry = outcome.checkpoint.field(FieldName::OtherOutcomeMeasures).unwrap();
        assert_eq!(entry.failure_kind, Some(FailureKind::NotFound));
    }

    #[tokio::test]
    async fn test_immediate_comparison() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::default();
        oracle.add_response("FIELD TO EXTRACT: sponsor", "sponsor: Acme Corp");
        let reference = ReferenceRecord::from_pairs([
            (FieldName::NctNumber.reference_column(), CASE),
            (FieldName::Sponsor.reference_column(), "ACME CORP"),
        ]);

        let outcome = extractor(&oracle, &dir)
            .extract(request(&[FieldName::Sponsor]).with_reference(reference))
            .await
            .unwrap();

        assert_eq!(outcome.comparisons.len(), 1);
        let result = &outcome.comparisons[0];
        assert!(result.is_match);
        assert_eq!(result.similarity_score, 1.0);
        assert_eq!(oracle.calls_containing("VALUE COMPARISON"), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_checkpoint() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::default();
        let config = ExtractorConfig {
            chunk_overlap: 10_000,
            ..ExtractorConfig::default()
        };

        let result = extractor_with(&oracle, &dir, config)
            .extract(request(&[FieldName::Sponsor]))
            .await;

        assert!(matches!(result, Err(ExtractorError::Config(_))));
        let store = CheckpointManager::new(dir.path()).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert_eq!(oracle.call_count(), 0);
    }

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn service(
        oracle: &MockOracle,
        dir: &TempDir,
    ) -> ExtractionService<MockOracle, CheckpointManager, PlainTextExtractor> {
        ExtractionService::with_checkpoint_dir(
            oracle.clone(),
            dir.path().join("checkpoints"),
            ExtractorConfig::default(),
        )
        .unwrap()
    }

    fn sponsor_oracle() -> MockOracle {
        let oracle = MockOracle::default();
        oracle.add_response(
            "- sponsor: ",
            "sponsor: Acme Corp\ncollaborators: NOT_FOUND\nfunder_type: NOT_FOUND",
        );
        oracle
    }

    #[tokio::test]
    async fn test_service_extract_merge_compare_delete() {
        let dir = TempDir::new().unwrap();
        let document = write(&dir, "NCT01234567_Prot_000.txt", PROTOCOL);
        let reference = write(
            &dir,
            "reference.csv",
            "NCT Number,Sponsor,Enrollment\n\
             NCT09999999,Other Co,5\n\
             NCT01234567,Acme Corp,120\n",
        );
        let oracle = sponsor_oracle();
        let service = service(&oracle, &dir);

        let outcome = service
            .extract(CASE, &document, DocumentType::Protocol, Some(&reference))
            .await
            .unwrap();
        assert!(outcome.checkpoint.is_complete());
        assert_eq!(outcome.checkpoint.resolved_value(FieldName::Sponsor), Some("Acme Corp"));
        assert_eq!(outcome.comparisons.len(), 1);
        assert!(outcome.comparisons[0].is_match);

        let summaries = service.list_checkpoints().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].case_id, CASE);
        assert!(summaries[0].is_complete);

        let record = service.merge(CASE).unwrap();
        assert_eq!(record.value(FieldName::Sponsor), Some("Acme Corp"));
        assert_eq!(record.value(FieldName::NctNumber), Some("NCT01234567"));
        assert!(record.value(FieldName::Enrollment).is_none());

        let report = service
            .compare(CASE, DocumentType::Protocol, &reference)
            .await
            .unwrap();
        assert_eq!(report.matches(), 2);
        assert_eq!(report.mismatches(), 0);
        assert!(report.missing_in_extraction.contains(&FieldName::Enrollment));

        assert!(service.delete(CASE, DocumentType::Protocol).unwrap());
        assert!(!service.delete(CASE, DocumentType::Protocol).unwrap());
        assert!(service.list_checkpoints().unwrap().is_empty());
        assert!(matches!(
            service.merge(CASE),
            Err(ExtractorError::NoCheckpoints(_))
        ));
    }

    #[tokio::test]
    async fn test_merge_skips_unreadable_sibling() {
        let dir = TempDir::new().unwrap();
        let document = write(&dir, "NCT01234567_Prot_000.txt", PROTOCOL);
        let oracle = sponsor_oracle();
        let service = service(&oracle, &dir);
        service
            .extract(CASE, &document, DocumentType::Protocol, None)
            .await
            .unwrap();

        let store = CheckpointManager::new(dir.path().join("checkpoints")).unwrap();
        std::fs::write(store.path_for(CASE, DocumentType::Sap), "{\"case_id\": ").unwrap();

        let record = service.merge(CASE).unwrap();
        assert_eq!(record.value(FieldName::Sponsor), Some("Acme Corp"));

        store.delete(CASE, DocumentType::Protocol).unwrap();
        assert!(matches!(
            service.merge(CASE),
            Err(ExtractorError::NoCheckpoints(_))
        ));
    }

    #[tokio::test]
    async fn test_service_resume_uses_recorded_path() {
        let dir = TempDir::new().unwrap();
        let document = write(&dir, "NCT01234567_Prot_000.txt", PROTOCOL);
        let oracle = MockOracle::failing();
        let service = service(&oracle, &dir);

        let first = service
            .extract(CASE, &document, DocumentType::Protocol, None)
            .await
            .unwrap();
        assert!(first.checkpoint.failed_fields > 0);
        assert_eq!(
            first.checkpoint.document_path,
            document.display().to_string()
        );

        let resumed = service.resume(CASE, DocumentType::Protocol).await.unwrap();
        assert!(resumed.resumed);
        assert_eq!(resumed.fields_attempted, first.checkpoint.failed_fields);
    }

    #[tokio::test]
    async fn test_service_resume_without_checkpoint() {
        let dir = TempDir::new().unwrap();
        let service = service(&MockOracle::default(), &dir);

        let result = service.resume(CASE, DocumentType::Sap).await;
        assert!(matches!(
            result,
            Err(ExtractorError::NoCheckpoint {
                document_type: DocumentType::Sap,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_service_setup_errors_touch_nothing() {
        let dir = TempDir::new().unwrap();
        let oracle = MockOracle::default();
        let service = service(&oracle, &dir);

        let missing = dir.path().join("missing.txt");
        let result = service
            .extract(CASE, &missing, DocumentType::Protocol, None)
            .await;
        assert!(matches!(result, Err(ExtractorError::Document { .. })));

        let document = write(&dir, "protocol.txt", PROTOCOL);
        let result = service
            .extract(
                CASE,
                &document,
                DocumentType::Protocol,
                Some(Path::new("/nonexistent/reference.csv")),
            )
            .await;
        assert!(matches!(result, Err(ExtractorError::Reference(_))));

        let pdf = write(&dir, "scan.pdf", "%PDF-1.7 binary");
        let result = service.extract(CASE, &pdf, DocumentType::Protocol, None).await;
        assert!(matches!(result, Err(ExtractorError::TextExtraction(_))));

        assert_eq!(oracle.call_count(), 0);
        assert!(service.list_checkpoints().unwrap().is_empty());
    }
}
