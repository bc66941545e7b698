use super::super::DocumentParser;

use crate::infrastructure::csv::CsvParser;

impl DocumentParser {
    pub(in crate::application::use_cases::document_parser) fn parse_txt(
        &self,
        bytes: &[u8],
    ) -> String {
        // same UTF-8 / Windows-1252 fallback as CSV uploads
        CsvParser::decode(bytes).trim().to_string()
    }
}
