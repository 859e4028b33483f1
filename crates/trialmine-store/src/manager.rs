//! Checkpoint manager - durable, atomic, file-per-key persistence

use crate::StoreError;
use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use trialmine_domain::traits::CheckpointStore;
use trialmine_domain::{CheckpointSummary, DocumentType, ExtractionCheckpoint};

const FILE_SUFFIX: &str = "_checkpoint.json";

/// Persists extraction checkpoints under one directory
///
/// Each `(case_id, document_type)` owns exactly one file; concurrent runs
/// against the same key are not supported.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Open (and create if needed) a checkpoint directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the checkpoint files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic file path for a case and document type
    ///
    /// Distinct case ids always map to distinct files.
    pub fn path_for(&self, case_id: &str, document_type: DocumentType) -> PathBuf {
        self.dir.join(format!(
            "{}_{}{}",
            escape_case_id(case_id),
            document_type.key(),
            FILE_SUFFIX
        ))
    }

    /// Write a checkpoint, replacing any previous version
    ///
    /// The file is written next to its target and renamed over it, so a crash
    /// leaves either the old or the new content. `last_update` is refreshed.
    pub fn save(&self, checkpoint: &mut ExtractionCheckpoint) -> Result<(), StoreError> {
        checkpoint.last_update = Utc::now();
        let path = self.path_for(&checkpoint.case_id, checkpoint.document_type);
        let json = serde_json::to_vec_pretty(checkpoint)?;

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;

        debug!(
            "Saved checkpoint {} ({}/{} terminal)",
            path.display(),
            checkpoint.completed_fields + checkpoint.failed_fields + checkpoint.skipped_fields,
            checkpoint.total_fields
        );
        Ok(())
    }

    /// Load the checkpoint for a case and document type
    ///
    /// Returns `Ok(None)` when no file exists and [`StoreError::Corrupt`] when
    /// the file cannot be parsed.
    pub fn load(
        &self,
        case_id: &str,
        document_type: DocumentType,
    ) -> Result<Option<ExtractionCheckpoint>, StoreError> {
        let path = self.path_for(case_id, document_type);
        read_checkpoint(&path)
    }

    /// Load a checkpoint that is still valid for the given source text
    ///
    /// Corrupt files and fingerprint drift are logged and treated as absent
    /// so the caller starts from a fresh checkpoint.
    pub fn load_valid(
        &self,
        case_id: &str,
        document_type: DocumentType,
        fingerprint: &str,
    ) -> Result<Option<ExtractionCheckpoint>, StoreError> {
        let checkpoint = match self.load(case_id, document_type) {
            Ok(found) => found,
            Err(StoreError::Corrupt { path, message }) => {
                warn!(
                    "Discarding unreadable checkpoint {}: {}",
                    path.display(),
                    message
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match checkpoint {
            Some(cp) if cp.text_fingerprint != fingerprint => {
                warn!(
                    "Source text of {} {} changed (fingerprint {} -> {}); discarding checkpoint",
                    case_id, document_type, cp.text_fingerprint, fingerprint
                );
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Remove a checkpoint; returns whether a file existed
    pub fn delete(&self, case_id: &str, document_type: DocumentType) -> Result<bool, StoreError> {
        let path = self.path_for(case_id, document_type);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted checkpoint {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Every readable checkpoint in the directory
    pub fn load_all(&self) -> Result<Vec<ExtractionCheckpoint>, StoreError> {
        let mut checkpoints = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_checkpoint = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(FILE_SUFFIX));
            if !is_checkpoint {
                continue;
            }
            match read_checkpoint(&path) {
                Ok(Some(cp)) => checkpoints.push(cp),
                Ok(None) => {}
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        checkpoints.sort_by(|a, b| {
            a.case_id
                .cmp(&b.case_id)
                .then(a.document_type.cmp(&b.document_type))
        });
        Ok(checkpoints)
    }

    /// Checkpoints belonging to one case
    pub fn load_case(&self, case_id: &str) -> Result<Vec<ExtractionCheckpoint>, StoreError> {
        let mut found = Vec::new();
        for document_type in DocumentType::all() {
            match self.load(case_id, document_type) {
                Ok(Some(cp)) => found.push(cp),
                Ok(None) => {}
                Err(e) => warn!("Skipping {} {}: {}", case_id, document_type, e),
            }
        }
        Ok(found)
    }

    /// Summaries of every readable checkpoint, sorted by case then document type
    pub fn list(&self) -> Result<Vec<CheckpointSummary>, StoreError> {
        Ok(self.load_all()?.iter().map(|cp| cp.summary()).collect())
    }
}

/// Make a case id safe for use as a file name
///
/// ASCII letters, digits and `-` pass through. Every other byte, `_`
/// included, becomes `_XX` in uppercase hex.
fn escape_case_id(case_id: &str) -> String {
    let mut escaped = String::with_capacity(case_id.len());
    for byte in case_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            escaped.push(char::from(byte));
        } else {
            escaped.push_str(&format!("_{:02X}", byte));
        }
    }
    escaped
}

fn read_checkpoint(path: &Path) -> Result<Option<ExtractionCheckpoint>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut checkpoint: ExtractionCheckpoint =
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    checkpoint.refresh_counters();
    Ok(Some(checkpoint))
}

impl CheckpointStore for CheckpointManager {
    type Error = StoreError;

    fn save(&self, checkpoint: &mut ExtractionCheckpoint) -> Result<(), Self::Error> {
        CheckpointManager::save(self, checkpoint)
    }

    fn load(
        &self,
        case_id: &str,
        document_type: DocumentType,
    ) -> Result<Option<ExtractionCheckpoint>, Self::Error> {
        CheckpointManager::load(self, case_id, document_type)
    }

    fn load_valid(
        &self,
        case_id: &str,
        document_type: DocumentType,
        fingerprint: &str,
    ) -> Result<Option<ExtractionCheckpoint>, Self::Error> {
        CheckpointManager::load_valid(self, case_id, document_type, fingerprint)
    }

    fn delete(&self, case_id: &str, document_type: DocumentType) -> Result<bool, Self::Error> {
        CheckpointManager::delete(self, case_id, document_type)
    }

    fn list(&self) -> Result<Vec<CheckpointSummary>, Self::Error> {
        CheckpointManager::list(self)
    }
}
