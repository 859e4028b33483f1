//! Cross-document merge with per-field source priority

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};
use trialmine_domain::{
    DocumentType, ExtractionCheckpoint, FieldName, MergeStatistics, MergedField, SourceDocument,
    UnifiedRecord,
};

const DEFAULT_PRIORITY: [DocumentType; 3] =
    [DocumentType::Protocol, DocumentType::Sap, DocumentType::Icf];

/// Resolves each field from the highest-priority document that has a value
#[derive(Debug, Clone)]
pub struct MergeEngine {
    overrides: HashMap<FieldName, Vec<DocumentType>>,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeEngine {
    /// Engine with the built-in priority table
    ///
    /// The statistical analysis plan wins for outcomes and enrollment, the
    /// consent form for the lay summary, and the protocol for eligibility
    /// demographics and everything else.
    pub fn new() -> Self {
        use DocumentType::{Icf, Protocol, Sap};

        let mut overrides = HashMap::new();
        for field in [
            FieldName::PrimaryOutcomeMeasures,
            FieldName::SecondaryOutcomeMeasures,
            FieldName::OtherOutcomeMeasures,
            FieldName::Enrollment,
        ] {
            overrides.insert(field, vec![Sap, Protocol, Icf]);
        }
        overrides.insert(FieldName::BriefSummary, vec![Icf, Protocol, Sap]);
        overrides.insert(FieldName::Sex, vec![Protocol, Icf, Sap]);
        overrides.insert(FieldName::Age, vec![Protocol, Icf, Sap]);

        Self { overrides }
    }

    /// Override the source order for one field
    pub fn with_priority(mut self, field: FieldName, order: Vec<DocumentType>) -> Self {
        self.overrides.insert(field, order);
        self
    }

    /// Source order used for a field
    pub fn priority_for(&self, field: FieldName) -> &[DocumentType] {
        self.overrides
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or(&DEFAULT_PRIORITY)
    }

    /// Merge every checkpoint of a case into one record
    ///
    /// Fields that no document resolved are kept with a null value and the
    /// list of documents consulted.
    pub fn merge(
        &self,
        case_id: &str,
        documents: &BTreeMap<DocumentType, ExtractionCheckpoint>,
    ) -> UnifiedRecord {
        let source_documents = documents
            .values()
            .map(|cp| SourceDocument {
                document_type: cp.document_type,
                path: cp.document_path.clone(),
            })
            .collect();

        let mut all_fields: Vec<FieldName> = documents
            .values()
            .flat_map(|cp| cp.fields.keys().copied())
            .collect();
        all_fields.sort();
        all_fields.dedup();

        let mut fields = BTreeMap::new();
        let mut by_document: BTreeMap<DocumentType, usize> = BTreeMap::new();

        for field in all_fields {
            let order = self.priority_for(field);
            let winner = order
                .iter()
                .filter_map(|dt| documents.get(dt))
                .find_map(|cp| cp.resolved_value(field).map(|v| (cp, v)));

            let merged = match winner {
                Some((cp, value)) => {
                    let entry = cp.field(field);
                    *by_document.entry(cp.document_type).or_default() += 1;
                    debug!("{}: {} from {}", case_id, field, cp.document_type);
                    MergedField::Resolved {
                        value: value.to_string(),
                        source_document: cp.document_type,
                        source_path: cp.document_path.clone(),
                        extraction_time: entry.and_then(|e| e.extraction_time),
                        confidence: entry.and_then(|e| e.confidence),
                    }
                }
                None => MergedField::Unresolved {
                    value: None,
                    attempted_documents: order
                        .iter()
                        .copied()
                        .filter(|dt| {
                            documents
                                .get(dt)
                                .is_some_and(|cp| cp.fields.contains_key(&field))
                        })
                        .collect(),
                },
            };
            fields.insert(field, merged);
        }

        let total_fields = fields.len();
        let extracted_fields = fields.values().filter(|f| f.value().is_some()).count();
        let statistics = MergeStatistics {
            total_fields,
            extracted_fields,
            extraction_rate: if total_fields == 0 {
                0.0
            } else {
                extracted_fields as f64 / total_fields as f64
            },
            by_document,
        };

        info!(
            "Merged {} document(s) for {}: {}/{} fields resolved",
            documents.len(),
            case_id,
            extracted_fields,
            total_fields
        );

        UnifiedRecord {
            case_id: case_id.to_string(),
            source_documents,
            fields,
            statistics,
        }
    }
}
