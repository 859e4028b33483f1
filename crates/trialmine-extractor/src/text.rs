//! Plain-text document reader

use crate::ExtractorError;
use trialmine_domain::traits::TextExtractor;

/// Reads documents that are already plain text
///
/// PDF conversion happens upstream; files handed to this extractor are the
/// converter's output, with `--- Page N ---` markers between pages. Raw PDF
/// bytes are refused rather than fed to the oracle as garbage.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    type Error = ExtractorError;

    fn extract(&self, document: &[u8]) -> Result<String, Self::Error> {
        if document.starts_with(b"%PDF-") {
            return Err(ExtractorError::TextExtraction(
                "binary PDF input; convert it to text first".to_string(),
            ));
        }

        let text = String::from_utf8_lossy(document);
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        Ok(text.replace("\r\n", "\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let text = PlainTextExtractor.extract(b"\xef\xbb\xbfTitle\r\nBody").unwrap();
        assert_eq!(text, "Title\nBody");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let text = PlainTextExtractor.extract(b"caf\xe9").unwrap();
        assert!(text.starts_with("caf"));
    }

    #[test]
    fn test_pdf_is_refused() {
        let err = PlainTextExtractor.extract(b"%PDF-1.7\n...").unwrap_err();
        assert!(matches!(err, ExtractorError::TextExtraction(_)));
    }
}
