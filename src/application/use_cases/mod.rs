pub mod ai_extraction;
pub mod document_parser;
pub mod intelligent_sorter;
pub mod prompts;
pub mod report_generation;

#[cfg(test)]
pub(crate) mod test_support;
