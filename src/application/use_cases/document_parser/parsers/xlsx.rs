use super::super::{render_table, DocumentParser};

use crate::domain::error::{AppError, Result};

use std::io::Cursor;

impl DocumentParser {
    /// First worksheet only, header row first.
    pub(in crate::application::use_cases::document_parser) fn parse_spreadsheet(
        &self,
        bytes: &[u8],
    ) -> Result<String> {
        use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| AppError::ParseError(format!("Failed to open Excel file: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::ParseError("No worksheet found".to_string()))?
            .map_err(|e| AppError::ParseError(format!("Failed to read Excel range: {}", e)))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Data::Empty => String::new(),
                        other => other
                            .as_string()
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| format!("{}", other)),
                    })
                    .collect::<Vec<String>>()
            })
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        tracing::debug!(rows = rows.len(), "Parsed spreadsheet upload");
        Ok(render_table(&rows))
    }
}
