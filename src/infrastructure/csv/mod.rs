// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Encoding and delimiter detection for uploaded spreadsheets

mod csv_parser;

pub use csv_parser::CsvParser;
