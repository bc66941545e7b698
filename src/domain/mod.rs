pub mod analysis;
pub mod document;
pub mod error;
pub mod llm_config;
pub mod tax;
