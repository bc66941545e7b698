use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const UNKNOWN_YEAR: &str = "Unknown Year";

/// A file received from a client, still in its raw encoded form.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub content: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
        }
    }

    /// Lower-cased extension without the dot, empty when the name has none.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default()
    }

    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.content);
        hex::encode(hasher.finalize())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "P&L_OR_ANNUAL_REPORT")]
    PnlOrAnnualReport,
    #[serde(rename = "DEPRECIATION_SCHEDULE")]
    DepreciationSchedule,
    #[serde(rename = "DEDUCTIONS_DOCUMENT")]
    DeductionsDocument,
    #[serde(rename = "OTHER")]
    Other,
}

impl DocumentKind {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "P&L_OR_ANNUAL_REPORT" => DocumentKind::PnlOrAnnualReport,
            "DEPRECIATION_SCHEDULE" => DocumentKind::DepreciationSchedule,
            "DEDUCTIONS_DOCUMENT" => DocumentKind::DeductionsDocument,
            _ => DocumentKind::Other,
        }
    }
}

/// Classifier verdict for a single document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Classification {
    #[serde(default = "default_kind", deserialize_with = "lenient_kind")]
    pub document_type: DocumentKind,
    #[serde(default, deserialize_with = "lenient_text")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fiscal_year: Option<String>,
}

impl Classification {
    pub fn unclassified() -> Self {
        Self {
            document_type: DocumentKind::Other,
            company_name: None,
            fiscal_year: None,
        }
    }

    /// Company name unless the classifier reported the "not found" sentinel.
    pub fn detected_company(&self) -> Option<&str> {
        self.company_name
            .as_deref()
            .filter(|name| !name.trim().is_empty() && *name != UNKNOWN_COMPANY)
    }

    pub fn detected_year(&self) -> Option<&str> {
        self.fiscal_year
            .as_deref()
            .filter(|year| !year.trim().is_empty() && *year != UNKNOWN_YEAR)
    }
}

fn default_kind() -> DocumentKind {
    DocumentKind::Other
}

fn lenient_kind<'de, D>(deserializer: D) -> std::result::Result<DocumentKind, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(label)) => DocumentKind::from_label(&label),
        _ => DocumentKind::Other,
    })
}

// Models return years both as 2023 and "2023".
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text.trim().to_string()),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub filename: String,
    #[serde(rename = "type")]
    pub document_type: DocumentKind,
    pub company_name_detected: Option<String>,
    pub fiscal_year_detected: Option<String>,
}

/// Collapse legal-entity spelling variants ("B.V.", "B V", "BV") so the same
/// company reported by two documents compares equal.
pub fn normalize_company_name(name: &str) -> String {
    if name.trim().is_empty() || name == UNKNOWN_COMPANY {
        return "unknown".to_string();
    }
    name.to_lowercase()
        .replace(['.', ','], "")
        .replace("b v", "bv")
        .replace("n v", "nv")
        .trim()
        .to_string()
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_is_letter = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_company_variants() {
        assert_eq!(normalize_company_name("XYZ Holding B.V."), "xyz holding bv");
        assert_eq!(normalize_company_name("XYZ Holding B V"), "xyz holding bv");
        assert_eq!(normalize_company_name("Acme Corp N.V."), "acme corp nv");
        assert_eq!(normalize_company_name("Unknown Company"), "unknown");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("xyz holding bv"), "Xyz Holding Bv");
        assert_eq!(title_case("o'neil & sons"), "O'Neil & Sons");
        assert_eq!(title_case("ACME 2go"), "Acme 2Go");
    }

    #[test]
    fn test_classification_accepts_numeric_year() {
        let parsed: Classification = serde_json::from_str(
            r#"{"document_type": "DEPRECIATION_SCHEDULE", "company_name": "Acme B.V.", "fiscal_year": 2023}"#,
        )
        .unwrap();
        assert_eq!(parsed.document_type, DocumentKind::DepreciationSchedule);
        assert_eq!(parsed.detected_year(), Some("2023"));
        assert_eq!(parsed.detected_company(), Some("Acme B.V."));
    }

    #[test]
    fn test_classification_sentinels_and_unknown_kind() {
        let parsed: Classification = serde_json::from_str(
            r#"{"document_type": "INVOICE", "company_name": "Unknown Company", "fiscal_year": "Unknown Year"}"#,
        )
        .unwrap();
        assert_eq!(parsed.document_type, DocumentKind::Other);
        assert_eq!(parsed.detected_company(), None);
        assert_eq!(parsed.detected_year(), None);
    }

    #[test]
    fn test_classification_missing_fields() {
        let parsed: Classification = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, Classification::unclassified());
    }

    #[test]
    fn test_file_metadata_serializes_type_key() {
        let meta = FileMetadata {
            filename: "pl.pdf".to_string(),
            document_type: DocumentKind::PnlOrAnnualReport,
            company_name_detected: Some("Acme B.V.".to_string()),
            fiscal_year_detected: None,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "P&L_OR_ANNUAL_REPORT");
        assert!(json["fiscal_year_detected"].is_null());
    }

    #[test]
    fn test_extension_and_fingerprint() {
        let doc = UploadedDocument::new("Report.PDF", b"abc".to_vec());
        assert_eq!(doc.extension(), "pdf");
        assert_eq!(
            doc.fingerprint(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
