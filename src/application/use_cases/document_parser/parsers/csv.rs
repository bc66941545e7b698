use super::super::{render_table, DocumentParser};

use crate::domain::error::Result;
use crate::infrastructure::csv::CsvParser;

impl DocumentParser {
    pub(in crate::application::use_cases::document_parser) fn parse_csv(
        &self,
        bytes: &[u8],
    ) -> Result<String> {
        let content = CsvParser::decode(bytes);
        let rows = CsvParser::new().parse_rows(&content)?;
        tracing::debug!(rows = rows.len(), "Parsed CSV upload");
        Ok(render_table(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_semicolon_csv() {
        let bytes = b"Post;Bedrag\nOmzet;500000\nKosten;250000\n";
        let text = DocumentParser::new().parse_csv(bytes).unwrap();
        assert_eq!(text, "Post    Bedrag\nOmzet   500000\nKosten  250000");
    }

    #[test]
    fn test_parse_windows_1252_csv() {
        // "Café" in Windows-1252
        let bytes = b"Name,Value\nCaf\xe9,1\n";
        let text = DocumentParser::new().parse_csv(bytes).unwrap();
        assert!(text.contains("Café"));
    }
}
