use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::{format_currency, sanitize_for_pdf, ReportData, REPORT_TITLE};
use crate::domain::error::Result;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MM: f32 = 72.0 / 25.4;
const MARGIN: f32 = 10.0 * MM;
const CELL_PADDING: f32 = 1.0 * MM;
/// Content stops this far above the page bottom, as with FPDF's auto page break.
const BOTTOM_MARGIN: f32 = 2.0 * MARGIN;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Font {
    Regular,
    Bold,
    Italic,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
    Right,
}

/// Helvetica advance widths (1/1000 em) for printable ASCII.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|ch| {
            let code = ch as u32;
            if (32..127).contains(&code) {
                HELVETICA_WIDTHS[(code - 32) as usize] as u32
            } else {
                556
            }
        })
        .sum();
    let bold_factor = if font == Font::Bold { 1.05 } else { 1.0 };
    units as f32 * size / 1000.0 * bold_factor
}

/// Latin-1 bytes for a WinAnsi-encoded string literal.
fn encode_text(text: &str) -> Vec<u8> {
    sanitize_for_pdf(text).chars().map(|ch| ch as u32 as u8).collect()
}

/// Cursor-based page writer. Coordinates are in points measured from the
/// top-left corner; they are flipped to PDF space when emitted.
struct Canvas {
    pages: Vec<Vec<Operation>>,
    x: f32,
    y: f32,
    font: Font,
    font_size: f32,
    text_color: (f32, f32, f32),
}

impl Canvas {
    fn new() -> Self {
        let mut canvas = Self {
            pages: Vec::new(),
            x: MARGIN,
            y: MARGIN,
            font: Font::Regular,
            font_size: 12.0,
            text_color: (0.0, 0.0, 0.0),
        };
        canvas.add_page();
        canvas
    }

    fn add_page(&mut self) {
        self.pages.push(vec![Operation::new("w", vec![(0.2 * MM).into()])]);
        self.x = MARGIN;
        self.y = MARGIN;
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // A page is pushed on construction, so there is always a last page.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn set_font(&mut self, font: Font, size: f32) {
        self.font = font;
        self.font_size = size;
    }

    fn set_text_color(&mut self, r: u8, g: u8, b: u8) {
        self.text_color = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    }

    fn usable_width(&self) -> f32 {
        PAGE_WIDTH - 2.0 * MARGIN
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT - BOTTOM_MARGIN {
            self.add_page();
        }
    }

    fn ln(&mut self, height: f32) {
        self.x = MARGIN;
        self.y += height;
    }

    /// Draw one cell at the cursor. A width of 0 extends to the right margin.
    fn cell(&mut self, width: f32, height: f32, text: &str, border: bool, align: Align, line_break: bool) {
        if self.x == MARGIN {
            self.ensure_space(height);
        }
        let width = if width <= 0.0 {
            PAGE_WIDTH - MARGIN - self.x
        } else {
            width
        };
        let (x, y) = (self.x, self.y);

        if border {
            self.ops().push(Operation::new(
                "re",
                vec![
                    x.into(),
                    (PAGE_HEIGHT - y - height).into(),
                    width.into(),
                    height.into(),
                ],
            ));
            self.ops().push(Operation::new("S", vec![]));
        }

        if !text.is_empty() {
            let text_w = text_width(text, self.font, self.font_size);
            let text_x = match align {
                Align::Left => x + CELL_PADDING,
                Align::Center => x + (width - text_w) / 2.0,
                Align::Right => x + width - CELL_PADDING - text_w,
            };
            let baseline = y + 0.5 * height + 0.3 * self.font_size;
            let (r, g, b) = self.text_color;
            let font = self.font.resource();
            let size = self.font_size;
            let ops = self.ops();
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
            ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
            ops.push(Operation::new(
                "Td",
                vec![text_x.into(), (PAGE_HEIGHT - baseline).into()],
            ));
            ops.push(Operation::new(
                "Tj",
                vec![Object::string_literal(encode_text(text))],
            ));
            ops.push(Operation::new("ET", vec![]));
        }

        if line_break {
            self.ln(height);
        } else {
            self.x += width;
        }
    }

    /// Word-wrapped block of left-aligned lines.
    fn multi_cell(&mut self, width: f32, line_height: f32, text: &str) {
        let max_width = width - 2.0 * CELL_PADDING;
        for line in wrap_words(text, max_width, self.font, self.font_size) {
            self.cell(width, line_height, &line, false, Align::Left, true);
        }
    }

    fn into_document(self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_dict = |base: &str| {
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base.to_string(),
                "Encoding" => "WinAnsiEncoding",
            }
        };
        let regular_id = doc.add_object(font_dict("Helvetica"));
        let bold_id = doc.add_object(font_dict("Helvetica-Bold"));
        let italic_id = doc.add_object(font_dict("Helvetica-Oblique"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
                "F3" => italic_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), (PAGE_WIDTH as i64).into(), (PAGE_HEIGHT as i64).into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

fn wrap_words(text: &str, max_width: f32, font: Font, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        for piece in split_long_word(word, max_width, font, size) {
            let candidate = if current.is_empty() {
                piece.clone()
            } else {
                format!("{} {}", current, piece)
            };
            if current.is_empty() || text_width(&candidate, font, size) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current = piece;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Hard-split a word wider than `max_width` into pieces that fit.
fn split_long_word(word: &str, max_width: f32, font: Font, size: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if current.chars().count() > 1 && text_width(&current, font, size) > max_width {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// One-page (or longer, with many audit flags) tax summary.
pub struct PdfReport;

impl PdfReport {
    pub fn render(data: &ReportData) -> Result<Vec<u8>> {
        let mut canvas = Canvas::new();
        let half = canvas.usable_width() / 2.0;
        let row_height = 10.0 * MM;

        canvas.set_font(Font::Bold, 16.0);
        canvas.cell(0.0, row_height, REPORT_TITLE, false, Align::Center, true);

        if data.company_name.is_some() || data.fiscal_year.is_some() {
            canvas.set_font(Font::Regular, 11.0);
            let subtitle = format!(
                "{} - Fiscal year {}",
                data.company_name.as_deref().unwrap_or("Unknown Company"),
                data.fiscal_year.as_deref().unwrap_or("Unknown Year")
            );
            canvas.cell(0.0, 6.0 * MM, &subtitle, false, Align::Center, true);
        }
        canvas.ln(10.0 * MM);

        canvas.set_font(Font::Bold, 12.0);
        canvas.cell(half, row_height, "Line Item", true, Align::Left, false);
        canvas.cell(half, row_height, "Amount", true, Align::Right, true);

        canvas.set_font(Font::Regular, 12.0);
        for label in ["Revenue", "Expenses", "Depreciation", "Deductions"] {
            canvas.cell(half, row_height, label, true, Align::Left, false);
            canvas.cell(half, row_height, &format_currency(data.item(label)), true, Align::Right, true);
        }

        canvas.set_font(Font::Bold, 12.0);
        canvas.cell(half, row_height, "Net Taxable Income", true, Align::Left, false);
        canvas.cell(
            half,
            row_height,
            &format_currency(data.item("Taxable Income")),
            true,
            Align::Right,
            true,
        );
        let applied_rate = data
            .item("Applied Tax Rate")
            .map(super::display_value)
            .unwrap_or_else(|| "N/A".to_string());
        canvas.cell(half, row_height, "Applied Tax Rate", true, Align::Left, false);
        canvas.cell(half, row_height, &applied_rate, true, Align::Right, true);
        canvas.cell(half, row_height, "Final Tax Owed", true, Align::Left, false);
        canvas.cell(
            half,
            row_height,
            &format_currency(data.item("Final Tax Owed")),
            true,
            Align::Right,
            true,
        );

        canvas.ln(10.0 * MM);

        if !data.audit_flags.is_empty() {
            canvas.set_font(Font::Bold, 12.0);
            canvas.cell(0.0, row_height, "Audit Flags & Notes", false, Align::Left, true);
            canvas.set_font(Font::Italic, 10.0);
            canvas.set_text_color(220, 50, 50);
            let width = canvas.usable_width();
            for flag in &data.audit_flags {
                canvas.multi_cell(width, 5.0 * MM, &format!("- {}", flag));
            }
            canvas.set_text_color(0, 0, 0);
        }

        canvas.into_document()
    }
}
