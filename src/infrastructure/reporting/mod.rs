mod excel;
mod pdf;

pub use excel::ExcelReport;
pub use pdf::PdfReport;

use serde_json::{Map, Value};

use crate::domain::analysis::AnalysisResult;
use crate::domain::error::Result;
use crate::shared::number_format::format_thousands;

pub const REPORT_TITLE: &str = "Corporate Tax Summary Report";

/// Lenient view over an analysis payload. Clients may post back edited or
/// partial JSON, so every section is optional.
#[derive(Debug, Clone, Default)]
pub struct ReportData {
    pub company_name: Option<String>,
    pub fiscal_year: Option<String>,
    pub breakdown: Map<String, Value>,
    pub audit_flags: Vec<String>,
}

impl ReportData {
    pub fn from_value(value: &Value) -> Self {
        let general = value.get("general_information");
        let text_field = |key: &str| {
            general
                .and_then(|info| info.get(key))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        let breakdown = value
            .get("tax_return_summary")
            .and_then(|summary| summary.get("breakdown"))
            .and_then(|breakdown| breakdown.as_object())
            .cloned()
            .unwrap_or_default();

        let audit_flags = value
            .get("audit_flags")
            .and_then(|flags| flags.as_array())
            .map(|flags| flags.iter().map(display_value).collect())
            .unwrap_or_default();

        Self {
            company_name: text_field("company_name"),
            fiscal_year: text_field("fiscal_year"),
            breakdown,
            audit_flags,
        }
    }

    pub fn from_analysis(analysis: &AnalysisResult) -> Result<Self> {
        Ok(Self::from_value(&serde_json::to_value(analysis)?))
    }

    pub fn item(&self, key: &str) -> Option<&Value> {
        self.breakdown.get(key)
    }
}

/// Render a value the way a person would type it, without JSON quoting.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

/// "EUR 1,234.56" for numbers, the plain value otherwise.
pub fn format_currency(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(number)) => match number.as_f64() {
            Some(amount) => format!("EUR {}", format_thousands(amount, 2)),
            None => number.to_string(),
        },
        Some(other) => display_value(other),
        None => "None".to_string(),
    }
}

/// Replace anything the standard PDF fonts cannot encode.
pub fn sanitize_for_pdf(text: &str) -> String {
    text.chars()
        .map(|ch| if (ch as u32) <= 0xFF { ch } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Some(&json!(1234.5))), "EUR 1,234.50");
        assert_eq!(format_currency(Some(&json!(0))), "EUR 0.00");
        assert_eq!(format_currency(Some(&json!("19.0%"))), "19.0%");
        assert_eq!(format_currency(None), "None");
        assert_eq!(format_currency(Some(&Value::Null)), "None");
    }

    #[test]
    fn test_sanitize_for_pdf() {
        assert_eq!(sanitize_for_pdf("ℹ️ Deductions of 5.00"), "?? Deductions of 5.00");
        assert_eq!(sanitize_for_pdf("Café"), "Café");
    }

    #[test]
    fn test_report_data_is_lenient() {
        let data = ReportData::from_value(&json!({"audit_flags": ["a", 3]}));
        assert!(data.breakdown.is_empty());
        assert_eq!(data.audit_flags, vec!["a", "3"]);
        assert_eq!(data.company_name, None);

        let data = ReportData::from_value(&json!({"tax_return_summary": null}));
        assert!(data.breakdown.is_empty());
    }

    #[test]
    fn test_report_data_reads_breakdown_in_order() {
        let data = ReportData::from_value(&json!({
            "general_information": {"company_name": "Acme Bv", "fiscal_year": "2023"},
            "tax_return_summary": {"breakdown": {"Revenue": 10.0, "Expenses": 4.0}}
        }));
        let keys: Vec<&String> = data.breakdown.keys().collect();
        assert_eq!(keys, vec!["Revenue", "Expenses"]);
        assert_eq!(data.company_name.as_deref(), Some("Acme Bv"));
    }
}
