//! Registry reference record loaded from a CSV export

use crate::ReconcileError;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use trialmine_domain::FieldName;

/// One registry row, keyed by column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceRecord {
    columns: BTreeMap<String, String>,
}

impl ReferenceRecord {
    /// Build a record from column/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(k, v)| (k.into().trim().to_string(), v.into()))
                .collect(),
        }
    }

    /// Load the reference row from a CSV file
    ///
    /// Uses the row whose "NCT Number" equals `case_id` when one exists,
    /// otherwise the first data row.
    pub fn from_path(path: &Path, case_id: Option<&str>) -> Result<Self, ReconcileError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, case_id)
            .map_err(|e| match e {
                ReconcileError::EmptyReference(_) => {
                    ReconcileError::EmptyReference(path.display().to_string())
                }
                other => other,
            })
    }

    /// Load the reference row from any CSV source
    pub fn from_reader<R: Read>(reader: R, case_id: Option<&str>) -> Result<Self, ReconcileError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();

        let mut first = None;
        for row in reader.records() {
            let row = row?;
            let record = Self::from_pairs(
                headers
                    .iter()
                    .zip(row.iter())
                    .map(|(h, v)| (h.to_string(), v.to_string())),
            );
            let is_case = match case_id {
                Some(id) => record
                    .value_for(FieldName::NctNumber)
                    .is_some_and(|v| v.eq_ignore_ascii_case(id.trim())),
                None => false,
            };
            if is_case {
                debug!("Reference row found for {}", case_id.unwrap_or_default());
                return Ok(record);
            }
            if first.is_none() {
                first = Some(record);
            }
        }

        first.ok_or_else(|| ReconcileError::EmptyReference("<reader>".to_string()))
    }

    /// Raw value of a column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    /// Non-empty reference value for a field
    pub fn value_for(&self, field: FieldName) -> Option<&str> {
        self.get(field.reference_column())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the record has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "NCT Number,Study Title,Sponsor,Phases,Enrollment\n\
NCT01234567,\"A Study of X, Y\",Acme Corp,PHASE2,120\n\
NCT07654321,Other Study,Globex,PHASE3,40\n";

    #[test]
    fn test_first_row_by_default() {
        let record = ReferenceRecord::from_reader(CSV.as_bytes(), None).unwrap();
        assert_eq!(record.value_for(FieldName::Sponsor), Some("Acme Corp"));
        assert_eq!(record.value_for(FieldName::StudyTitle), Some("A Study of X, Y"));
        assert_eq!(record.value_for(FieldName::Acronym), None);
    }

    #[test]
    fn test_row_matching_case_id() {
        let record = ReferenceRecord::from_reader(CSV.as_bytes(), Some("nct07654321")).unwrap();
        assert_eq!(record.value_for(FieldName::Sponsor), Some("Globex"));
    }

    #[test]
    fn test_unknown_case_falls_back_to_first_row() {
        let record = ReferenceRecord::from_reader(CSV.as_bytes(), Some("NCT99999999")).unwrap();
        assert_eq!(record.value_for(FieldName::Phases), Some("PHASE2"));
    }

    #[test]
    fn test_header_only_file_is_an_error() {
        let result = ReferenceRecord::from_reader("NCT Number,Sponsor\n".as_bytes(), None);
        assert!(matches!(result, Err(ReconcileError::EmptyReference(_))));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.csv");
        std::fs::write(&path, CSV).unwrap();
        let record = ReferenceRecord::from_path(&path, None).unwrap();
        assert_eq!(record.len(), 5);
    }
}
