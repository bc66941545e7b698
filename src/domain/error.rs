use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppError {
    NotFound(String),
    ValidationError(String),
    ParseError(String),
    LLMError(String),
    DatabaseError(String),
    IoError(String),
    ConfigError(String),
    ReportError(String),
    /// The uploaded pool was read but cannot produce a consistent analysis.
    AnalysisRejected(String),
}

impl AppError {
    /// Message without the category prefix, as surfaced to API clients.
    pub fn detail(&self) -> &str {
        match self {
            AppError::NotFound(msg)
            | AppError::ValidationError(msg)
            | AppError::ParseError(msg)
            | AppError::LLMError(msg)
            | AppError::DatabaseError(msg)
            | AppError::IoError(msg)
            | AppError::ConfigError(msg)
            | AppError::ReportError(msg)
            | AppError::AnalysisRejected(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::LLMError(msg) => write!(f, "LLM error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::ReportError(msg) => write!(f, "Report error: {}", msg),
            AppError::AnalysisRejected(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<lopdf::Error> for AppError {
    fn from(err: lopdf::Error) -> Self {
        AppError::ReportError(format!("PDF: {}", err))
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AppError::ReportError(format!("XLSX: {}", err))
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_category_prefix() {
        let err = AppError::LLMError("timeout".to_string());
        assert_eq!(err.to_string(), "LLM error: timeout");
        assert_eq!(err.detail(), "timeout");
    }

    #[test]
    fn test_rejection_displays_bare_message() {
        let err = AppError::AnalysisRejected("Analysis failed. Nope.".to_string());
        assert_eq!(err.to_string(), "Analysis failed. Nope.");
    }
}
