pub mod use_cases;

pub use use_cases::intelligent_sorter::IntelligentSorterUseCase;
pub use use_cases::report_generation::{ReportFormat, ReportGenerationUseCase};
