//! Metadata recoverable from a document's file name
//!
//! Registry downloads are named like `NCT01234567_Prot_SAP_000.pdf`, which
//! carries the trial identifier and document kind without asking the oracle.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use trialmine_domain::DocumentType;

static CASE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)NCT\d{8}").expect("static pattern"));

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:[_\-\s]v(\d+(?:\.\d+)*))|(?:_(\d{3})(?:[_.\-]|$))").expect("static pattern")
});

/// What a file name says about its document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameMetadata {
    /// Trial identifier, upper-cased
    pub case_id: Option<String>,
    /// Document kind named by a token such as `Prot`, `SAP` or `ICF`
    pub document_type: Option<DocumentType>,
    /// Version token, e.g. `2.1` from `_v2.1` or `000` from `_000`
    pub version: Option<String>,
}

impl FilenameMetadata {
    /// Inspect the final component of `path`
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let case_id = CASE_ID.find(&name).map(|m| m.as_str().to_uppercase());

        let document_type = stem
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|token| !token.is_empty())
            .find_map(DocumentType::parse);

        let version = VERSION.captures(&stem).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string())
        });

        Self {
            case_id,
            document_type,
            version,
        }
    }

    /// File name shown as provenance for side-channel values
    pub fn label(path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_style_name() {
        let meta = FilenameMetadata::from_path("/data/docs/nct01234567_Prot_000.pdf");
        assert_eq!(meta.case_id.as_deref(), Some("NCT01234567"));
        assert_eq!(meta.document_type, Some(DocumentType::Protocol));
        assert_eq!(meta.version.as_deref(), Some("000"));
    }

    #[test]
    fn test_sap_and_consent() {
        let meta = FilenameMetadata::from_path("NCT09876543-SAP-v2.1.txt");
        assert_eq!(meta.document_type, Some(DocumentType::Sap));
        assert_eq!(meta.version.as_deref(), Some("2.1"));

        let meta = FilenameMetadata::from_path("informed consent form.txt");
        assert_eq!(meta.document_type, Some(DocumentType::Icf));
        assert!(meta.case_id.is_none());
    }

    #[test]
    fn test_nothing_recognisable() {
        assert_eq!(
            FilenameMetadata::from_path("notes.txt"),
            FilenameMetadata::default()
        );
        // Too few digits for an identifier
        assert!(FilenameMetadata::from_path("NCT123_Prot.pdf").case_id.is_none());
    }

    #[test]
    fn test_label() {
        assert_eq!(FilenameMetadata::label("/a/b/NCT01234567_ICF.pdf"), "NCT01234567_ICF.pdf");
    }
}
