use super::super::DocumentParser;

use crate::domain::error::{AppError, Result};

use docx_rs::{
    DocumentChild, InsertChild, Paragraph, ParagraphChild, Run, RunChild, Table, TableCell,
    TableCellContent, TableChild, TableRowChild,
};

impl DocumentParser {
    /// Body paragraphs and tables in document order; table cells are joined with " | ".
    pub(in crate::application::use_cases::document_parser) fn parse_docx(
        &self,
        bytes: &[u8],
    ) -> Result<String> {
        let docx = docx_rs::read_docx(bytes)
            .map_err(|e| AppError::ParseError(format!("Failed to parse DOCX file: {}", e)))?;

        let mut lines = Vec::new();
        for child in &docx.document.children {
            match child {
                DocumentChild::Paragraph(paragraph) => push_line(&mut lines, paragraph_text(paragraph)),
                DocumentChild::Table(table) => table_lines(table, &mut lines),
                _ => {}
            }
        }

        Ok(lines.join("\n"))
    }
}

fn push_line(lines: &mut Vec<String>, text: String) {
    if !text.trim().is_empty() {
        lines.push(text);
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut buffer = String::new();
    for child in &paragraph.children {
        collect_paragraph_child(child, &mut buffer);
    }
    buffer
}

fn collect_paragraph_child(child: &ParagraphChild, buffer: &mut String) {
    match child {
        ParagraphChild::Run(run) => collect_run(run, buffer),
        ParagraphChild::Hyperlink(link) => {
            for nested in &link.children {
                collect_paragraph_child(nested, buffer);
            }
        }
        ParagraphChild::Insert(insert) => {
            for nested in &insert.children {
                if let InsertChild::Run(run) = nested {
                    collect_run(run, buffer);
                }
            }
        }
        _ => {}
    }
}

fn collect_run(run: &Run, buffer: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(text) => buffer.push_str(&text.text),
            RunChild::Tab(_) | RunChild::PTab(_) => buffer.push('\t'),
            RunChild::Break(_) => buffer.push('\n'),
            RunChild::Sym(sym) => buffer.push_str(&sym.char),
            _ => {}
        }
    }
}

fn table_lines(table: &Table, lines: &mut Vec<String>) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| {
                let TableRowChild::TableCell(cell) = cell;
                cell_text(cell)
            })
            .filter(|text| !text.trim().is_empty())
            .collect();
        push_line(lines, cells.join(" | "));
    }
}

fn cell_text(cell: &TableCell) -> String {
    let mut parts = Vec::new();
    for content in &cell.children {
        match content {
            TableCellContent::Paragraph(paragraph) => push_line(&mut parts, paragraph_text(paragraph)),
            TableCellContent::Table(table) => {
                let mut nested = Vec::new();
                table_lines(table, &mut nested);
                push_line(&mut parts, nested.join(" "));
            }
            _ => {}
        }
    }
    parts.join(" ")
}
