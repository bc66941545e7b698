use serde::{Deserialize, Serialize};

use crate::domain::document::FileMetadata;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralInformation {
    pub company_name: String,
    pub fiscal_year: String,
}

/// Line items of the tax computation, keyed the way the report renderers
/// and API clients expect them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    #[serde(rename = "Revenue")]
    pub revenue: f64,
    #[serde(rename = "Expenses")]
    pub expenses: f64,
    #[serde(rename = "Depreciation")]
    pub depreciation: f64,
    #[serde(rename = "Deductions")]
    pub deductions: f64,
    #[serde(rename = "Taxable Income")]
    pub taxable_income: f64,
    #[serde(rename = "Applied Tax Rate")]
    pub applied_tax_rate: String,
    #[serde(rename = "Final Tax Owed")]
    pub final_tax_owed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxReturnSummary {
    pub breakdown: TaxBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub general_information: GeneralInformation,
    pub tax_return_summary: TaxReturnSummary,
    pub file_metadata: Vec<FileMetadata>,
    pub audit_flags: Vec<String>,
}

/// Row of the stored analysis history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub analysis_id: String,
    pub company_name: String,
    pub fiscal_year: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::DocumentKind;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            analysis_id: None,
            created_at: None,
            general_information: GeneralInformation {
                company_name: "Acme Bv".to_string(),
                fiscal_year: "2023".to_string(),
            },
            tax_return_summary: TaxReturnSummary {
                breakdown: TaxBreakdown {
                    revenue: 500_000.0,
                    expenses: 300_000.0,
                    depreciation: 0.0,
                    deductions: 0.0,
                    taxable_income: 200_000.0,
                    applied_tax_rate: "19.0%".to_string(),
                    final_tax_owed: 38_000.0,
                },
            },
            file_metadata: vec![FileMetadata {
                filename: "pl.pdf".to_string(),
                document_type: DocumentKind::PnlOrAnnualReport,
                company_name_detected: Some("Acme B.V.".to_string()),
                fiscal_year_detected: Some("2023".to_string()),
            }],
            audit_flags: vec![],
        }
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        let breakdown = &json["tax_return_summary"]["breakdown"];
        assert_eq!(breakdown["Taxable Income"], 200_000.0);
        assert_eq!(breakdown["Applied Tax Rate"], "19.0%");
        assert_eq!(json["general_information"]["company_name"], "Acme Bv");
        assert!(json.get("analysis_id").is_none());
    }

    #[test]
    fn test_breakdown_key_order_is_stable() {
        let json = serde_json::to_value(sample()).unwrap();
        let keys: Vec<&str> = json["tax_return_summary"]["breakdown"]
            .as_object()
            .unwrap()
            .keys()
            .map(|k| k.as_str())
            .collect();
        assert_eq!(
            keys,
            vec![
                "Revenue",
                "Expenses",
                "Depreciation",
                "Deductions",
                "Taxable Income",
                "Applied Tax Rate",
                "Final Tax Owed"
            ]
        );
    }
}
