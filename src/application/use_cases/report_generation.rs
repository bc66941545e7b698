use crate::domain::error::{AppError, Result};
use crate::infrastructure::db::AnalysisRepository;
use crate::infrastructure::reporting::{ExcelReport, PdfReport, ReportData};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Excel,
}

impl ReportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "tax_summary_report.pdf",
            ReportFormat::Excel => "tax_summary_report.xlsx",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "pdf" => Ok(ReportFormat::Pdf),
            "excel" | "xlsx" => Ok(ReportFormat::Excel),
            other => Err(AppError::NotFound(format!(
                "Unknown report format '{}'",
                other
            ))),
        }
    }
}

pub struct ReportGenerationUseCase {
    repository: Option<Arc<AnalysisRepository>>,
}

impl ReportGenerationUseCase {
    pub fn new(repository: Option<Arc<AnalysisRepository>>) -> Self {
        Self { repository }
    }

    /// Render whatever analysis JSON the client posts back, edited or not.
    pub fn render(&self, format: ReportFormat, payload: &Value) -> Result<Vec<u8>> {
        Self::render_data(format, &ReportData::from_value(payload))
    }

    pub async fn render_stored(&self, id: &str, format: ReportFormat) -> Result<Vec<u8>> {
        let repository = self
            .repository
            .as_ref()
            .ok_or_else(|| AppError::NotFound("Analysis history is disabled".to_string()))?;
        let analysis = repository.get(id).await?;
        Self::render_data(format, &ReportData::from_analysis(&analysis)?)
    }

    fn render_data(format: ReportFormat, data: &ReportData) -> Result<Vec<u8>> {
        match format {
            ReportFormat::Pdf => PdfReport::render(data),
            ReportFormat::Excel => ExcelReport::render(data),
        }
    }
}
