pub mod sqlite;

pub use sqlite::AnalysisRepository;
