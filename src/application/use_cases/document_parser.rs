use crate::domain::document::UploadedDocument;
use crate::domain::error::Result;

mod parsers;

/// Turns an uploaded file into plain text the extraction prompts can read.
#[derive(Debug, Clone, Default)]
pub struct DocumentParser;

impl DocumentParser {
    pub fn new() -> Self {
        Self
    }

    /// Unsupported types yield empty text and are skipped by the caller.
    pub fn extract_text(&self, document: &UploadedDocument) -> Result<String> {
        let bytes = document.content.as_slice();
        let text = match document.extension().as_str() {
            "pdf" => self.parse_pdf(bytes)?,
            "csv" => self.parse_csv(bytes)?,
            "xls" | "xlsx" | "xlsm" => self.parse_spreadsheet(bytes)?,
            "docx" => self.parse_docx(bytes)?,
            "txt" | "md" => self.parse_txt(bytes),
            other => {
                tracing::debug!(
                    filename = %document.filename,
                    extension = other,
                    "Unsupported file type, no text extracted"
                );
                String::new()
            }
        };
        Ok(text)
    }
}

/// Column-aligned text table, one line per row.
fn render_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(|row| row.len()).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            let line = (0..columns)
                .map(|idx| {
                    let cell = row.get(idx).map(String::as_str).unwrap_or("");
                    format!("{:<width$}", cell, width = widths[idx])
                })
                .collect::<Vec<_>>()
                .join("  ");
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_aligns_columns() {
        let rows = vec![
            vec!["Item".to_string(), "Amount".to_string()],
            vec!["Revenue".to_string(), "500000".to_string()],
            vec!["Costs".to_string()],
        ];
        assert_eq!(
            render_table(&rows),
            "Item     Amount\nRevenue  500000\nCosts"
        );
    }

    #[test]
    fn test_unsupported_extension_is_empty() {
        let parser = DocumentParser::new();
        let doc = UploadedDocument::new("photo.png", vec![0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(parser.extract_text(&doc).unwrap(), "");
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let parser = DocumentParser::new();
        let doc = UploadedDocument::new("NOTES.TXT", b"Fiscal year 2023".to_vec());
        assert_eq!(parser.extract_text(&doc).unwrap(), "Fiscal year 2023");
    }
}
