use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};
use serde_json::Value;

use super::{display_value, ReportData, REPORT_TITLE};
use crate::domain::error::Result;

pub const SHEET_NAME: &str = "Tax Summary";

pub struct ExcelReport;

impl ExcelReport {
    pub fn render(data: &ReportData) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();

        let title_format = Format::new()
            .set_bold()
            .set_font_size(14)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        let header_format = Format::new().set_bold().set_border(FormatBorder::Thin);
        let money_format = Format::new().set_num_format("€#,##0.00");

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;
        worksheet.merge_range(0, 0, 0, 1, REPORT_TITLE, &title_format)?;
        worksheet.set_row_height(0, 30)?;
        worksheet.set_column_width(0, 35)?;
        worksheet.set_column_width(1, 20)?;

        worksheet.write_string_with_format(1, 0, "Line Item", &header_format)?;
        worksheet.write_string_with_format(1, 1, "Amount", &header_format)?;

        for (offset, (label, value)) in data.breakdown.iter().enumerate() {
            let row = 2 + offset as u32;
            worksheet.write_string(row, 0, label.as_str())?;
            match value {
                Value::Number(number) => {
                    let amount = number.as_f64().unwrap_or_default();
                    worksheet.write_number_with_format(row, 1, amount, &money_format)?;
                }
                Value::Null => {}
                other => {
                    worksheet.write_string(row, 1, display_value(other))?;
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, Xlsx};
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_render_breakdown_rows() {
        let data = ReportData::from_value(&json!({
            "tax_return_summary": {"breakdown": {
                "Revenue": 500000.0, "Expenses": 250000.5,
                "Applied Tax Rate": "19.0%", "Final Tax Owed": null
            }}
        }));
        let bytes = ExcelReport::render(&data).unwrap();

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();

        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String(REPORT_TITLE.to_string()))
        );
        assert_eq!(range.get_value((1, 0)), Some(&Data::String("Line Item".to_string())));
        assert_eq!(range.get_value((2, 0)), Some(&Data::String("Revenue".to_string())));
        assert_eq!(range.get_value((2, 1)), Some(&Data::Float(500000.0)));
        assert_eq!(range.get_value((3, 1)), Some(&Data::Float(250000.5)));
        assert_eq!(range.get_value((4, 1)), Some(&Data::String("19.0%".to_string())));
        assert_eq!(
            range.get_value((5, 0)),
            Some(&Data::String("Final Tax Owed".to_string()))
        );
    }

    #[test]
    fn test_render_empty_breakdown() {
        let bytes = ExcelReport::render(&ReportData::default()).unwrap();
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        assert_eq!(range.get_value((1, 1)), Some(&Data::String("Amount".to_string())));
        assert_eq!(range.get_value((2, 0)), None);
    }
}
