use super::super::DocumentParser;

use crate::domain::error::{AppError, Result};

impl DocumentParser {
    pub(in crate::application::use_cases::document_parser) fn parse_pdf(
        &self,
        bytes: &[u8],
    ) -> Result<String> {
        use lopdf::Document;

        let document = Document::load_mem(bytes)
            .map_err(|e| AppError::ParseError(format!("Failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for (page_num, _) in document.get_pages() {
            match document.extract_text(&[page_num]) {
                Ok(page_text) => {
                    let trimmed = page_text.trim();
                    if !trimmed.is_empty() {
                        pages.push(trimmed.to_string());
                    }
                }
                Err(e) => {
                    tracing::debug!(page = page_num, error = %e, "Skipping unreadable PDF page");
                }
            }
        }

        Ok(pages.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::UploadedDocument;
    use crate::infrastructure::reporting::{PdfReport, ReportData};
    use serde_json::json;

    #[test]
    fn test_parse_generated_pdf() {
        let data = ReportData::from_value(&json!({
            "general_information": {"company_name": "Acme Holding Bv", "fiscal_year": "2023"},
            "tax_return_summary": {"breakdown": {"Revenue": 500000.0}}
        }));
        let bytes = PdfReport::render(&data).unwrap();

        let text = DocumentParser::new()
            .extract_text(&UploadedDocument::new("report.pdf", bytes))
            .unwrap();
        assert!(text.contains("Corporate Tax Summary Report"));
        assert!(text.contains("Revenue"));
    }

    #[test]
    fn test_garbage_pdf_is_parse_error() {
        let err = DocumentParser::new()
            .parse_pdf(b"definitely not a pdf")
            .unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }
}
