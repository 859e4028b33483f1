//! Document types of a trial filing

use serde::{Deserialize, Serialize};

/// Kind of source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentType {
    /// Study protocol
    #[serde(rename = "Protocol")]
    Protocol,
    /// Statistical analysis plan
    #[serde(rename = "SAP")]
    Sap,
    /// Informed consent form
    #[serde(rename = "ICF")]
    Icf,
}

impl DocumentType {
    /// All document types
    pub fn all() -> [DocumentType; 3] {
        [DocumentType::Protocol, DocumentType::Sap, DocumentType::Icf]
    }

    /// Display label ("Protocol", "SAP", "ICF")
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Protocol => "Protocol",
            DocumentType::Sap => "SAP",
            DocumentType::Icf => "ICF",
        }
    }

    /// Lower-case key used in checkpoint file names
    pub fn key(&self) -> &'static str {
        match self {
            DocumentType::Protocol => "protocol",
            DocumentType::Sap => "sap",
            DocumentType::Icf => "icf",
        }
    }

    /// Parse a document type, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "protocol" | "prot" => Some(DocumentType::Protocol),
            "sap" | "statistical analysis plan" => Some(DocumentType::Sap),
            "icf" | "consent" | "informed consent form" => Some(DocumentType::Icf),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid document type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(DocumentType::parse("SAP"), Some(DocumentType::Sap));
        assert_eq!(DocumentType::parse("protocol"), Some(DocumentType::Protocol));
        assert_eq!(DocumentType::parse(" Icf "), Some(DocumentType::Icf));
        assert!(DocumentType::parse("memo").is_none());
    }

    #[test]
    fn test_serde_labels() {
        assert_eq!(serde_json::to_string(&DocumentType::Sap).unwrap(), "\"SAP\"");
        let parsed: DocumentType = serde_json::from_str("\"Protocol\"").unwrap();
        assert_eq!(parsed, DocumentType::Protocol);
    }
}
