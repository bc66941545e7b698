use crate::application::use_cases::ai_extraction::{amount, truncate_chars, AiExtractor};
use crate::application::use_cases::document_parser::DocumentParser;
use crate::application::use_cases::prompts::{
    CLASSIFICATION_PROMPT, DEDUCTIONS_OVERRIDE_PROMPT, DEPRECIATION_OVERRIDE_PROMPT,
    HOLISTIC_ANALYSIS_PROMPT,
};
use crate::domain::analysis::{
    AnalysisResult, GeneralInformation, TaxBreakdown, TaxReturnSummary,
};
use crate::domain::document::{
    normalize_company_name, title_case, Classification, DocumentKind, FileMetadata,
    UploadedDocument, UNKNOWN_COMPANY, UNKNOWN_YEAR,
};
use crate::domain::error::{AppError, Result};
use crate::domain::tax::TaxRegime;
use crate::infrastructure::config::LlmSettings;
use crate::infrastructure::db::AnalysisRepository;
use crate::infrastructure::llm_clients::LLMClient;
use crate::interfaces::http::{add_log, LogEntry};
use crate::shared::number_format::format_thousands;

use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

const DOCUMENT_SEPARATOR: &str = "\n\n--- END OF DOCUMENT ---\n\n";

/// Text of an upload that survived parsing, with its classifier verdict.
struct SortedDocument {
    filename: String,
    text: String,
    kind: DocumentKind,
}

/// Classify a pool of uploads, check they describe one company and one
/// fiscal year, then extract the figures and compute the tax.
pub struct IntelligentSorterUseCase {
    extractor: AiExtractor,
    parser: DocumentParser,
    tax_regime: TaxRegime,
    repository: Option<Arc<AnalysisRepository>>,
    classification_chars: usize,
    max_concurrency: usize,
}

impl IntelligentSorterUseCase {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        settings: &LlmSettings,
        tax_regime: TaxRegime,
        repository: Option<Arc<AnalysisRepository>>,
    ) -> Self {
        Self {
            extractor: AiExtractor::new(llm_client, settings),
            parser: DocumentParser::new(),
            tax_regime,
            repository,
            classification_chars: settings.classification_chars,
            max_concurrency: settings.max_concurrency.max(1),
        }
    }

    pub async fn analyze(
        &self,
        documents: Vec<UploadedDocument>,
        logs: &Arc<Mutex<Vec<LogEntry>>>,
    ) -> Result<AnalysisResult> {
        if documents.is_empty() {
            return Err(AppError::ValidationError("No files were uploaded.".to_string()));
        }

        add_log(
            logs,
            "INFO",
            "Sorter",
            &format!("Starting analysis of {} file(s)", documents.len()),
        );

        let mut audit_flags = Vec::new();
        let readable = self.read_documents(&documents, &mut audit_flags, logs);

        // Step 1: classify, keeping upload order
        let classifications: Vec<Classification> = stream::iter(
            readable
                .iter()
                .map(|(filename, text)| self.classify(filename, text)),
        )
        .buffered(self.max_concurrency)
        .collect()
        .await;

        let mut company_names = BTreeSet::new();
        let mut fiscal_years = BTreeSet::new();
        let mut file_metadata = Vec::new();
        let mut sorted = Vec::new();

        for ((filename, text), classification) in readable.into_iter().zip(classifications) {
            if let Some(company) = classification.detected_company() {
                company_names.insert(normalize_company_name(company));
            }
            if let Some(year) = classification.detected_year() {
                fiscal_years.insert(year.to_string());
            }
            file_metadata.push(FileMetadata {
                filename: filename.clone(),
                document_type: classification.document_type,
                company_name_detected: classification.company_name.clone(),
                fiscal_year_detected: classification.fiscal_year.clone(),
            });
            sorted.push(SortedDocument {
                filename,
                text,
                kind: classification.document_type,
            });
        }

        // Step 2: one company, one year
        if company_names.len() > 1 {
            return Err(self.reject(
                logs,
                format!(
                    "Analysis failed. Documents from multiple companies were detected: {}. Please upload documents for only one company.",
                    list_literal(&company_names)
                ),
            ));
        }
        if fiscal_years.len() > 1 {
            return Err(self.reject(
                logs,
                format!(
                    "Analysis failed. Documents from multiple fiscal years were detected: {}. Please upload documents for a single year only.",
                    list_literal(&fiscal_years)
                ),
            ));
        }

        let company_name = company_names
            .iter()
            .next()
            .map(|name| title_case(name))
            .unwrap_or_else(|| UNKNOWN_COMPANY.to_string());
        let fiscal_year = fiscal_years
            .iter()
            .next()
            .cloned()
            .unwrap_or_else(|| UNKNOWN_YEAR.to_string());

        // Step 3: holistic figures from the primary statements
        let primary: Vec<&str> = sorted
            .iter()
            .filter(|doc| doc.kind == DocumentKind::PnlOrAnnualReport)
            .map(|doc| doc.text.as_str())
            .collect();
        if primary.is_empty() {
            return Err(self.reject(
                logs,
                "Analysis failed. No primary financial document (P&L or Annual Report) was found."
                    .to_string(),
            ));
        }

        let holistic = match self
            .extractor
            .extract(&primary.join(DOCUMENT_SEPARATOR), HOLISTIC_ANALYSIS_PROMPT)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                return Err(self.reject(logs, format!("Holistic analysis failed: {}", e.detail())));
            }
        };

        let revenue = amount(holistic.get("revenue"));
        let expenses = amount(holistic.get("expenses"));
        let mut depreciation = amount(holistic.get("depreciation"));

        // Step 4: overrides from supplemental documents
        let schedule = sorted
            .iter()
            .find(|doc| doc.kind == DocumentKind::DepreciationSchedule);
        if let Some(schedule) = schedule {
            match self
                .extractor
                .extract(&schedule.text, DEPRECIATION_OVERRIDE_PROMPT)
                .await
            {
                Ok(value) => {
                    if let Some(figure) = value.get("figure") {
                        depreciation = amount(Some(figure));
                    }
                }
                Err(e) => {
                    warn!(filename = %schedule.filename, error = %e, "Depreciation override failed, keeping holistic value");
                }
            }
            audit_flags.push(format!(
                "ℹ️ Depreciation value of {} was taken from override document: {}",
                format_thousands(depreciation, 2),
                schedule.filename
            ));
        }

        let deduction_docs: Vec<&SortedDocument> = sorted
            .iter()
            .filter(|doc| doc.kind == DocumentKind::DeductionsDocument)
            .collect();
        let mut deductions = 0.0;
        if !deduction_docs.is_empty() {
            for doc in &deduction_docs {
                match self
                    .extractor
                    .extract(&doc.text, DEDUCTIONS_OVERRIDE_PROMPT)
                    .await
                {
                    Ok(value) => deductions += amount(value.get("figure")),
                    Err(e) => {
                        warn!(filename = %doc.filename, error = %e, "Deductions extraction failed, counting as zero");
                    }
                }
            }
            audit_flags.push(format!(
                "ℹ️ Deductions of {} were calculated from supplemental document(s).",
                format_thousands(deductions, 2)
            ));
        }

        // Step 5: tax
        let taxable_income = revenue - expenses - depreciation - deductions;
        let assessment = self.tax_regime.assess(taxable_income);

        if depreciation == 0.0 && schedule.is_none() {
            audit_flags.push(
                "⚠️ Depreciation not found and no specific schedule was provided. Assumed to be zero."
                    .to_string(),
            );
        }

        let mut result = AnalysisResult {
            analysis_id: None,
            created_at: None,
            general_information: GeneralInformation {
                company_name,
                fiscal_year,
            },
            tax_return_summary: TaxReturnSummary {
                breakdown: TaxBreakdown {
                    revenue,
                    expenses,
                    depreciation,
                    deductions,
                    taxable_income,
                    applied_tax_rate: assessment.applied_rate,
                    final_tax_owed: assessment.tax_owed.max(0.0),
                },
            },
            file_metadata,
            audit_flags,
        };

        if let Some(repository) = &self.repository {
            if let Err(e) = repository.save(&mut result).await {
                add_log(
                    logs,
                    "ERROR",
                    "Sorter",
                    &format!("Failed to store analysis: {}", e),
                );
            }
        }

        add_log(
            logs,
            "INFO",
            "Sorter",
            &format!(
                "Analysis complete for {} ({}): taxable income {}",
                result.general_information.company_name,
                result.general_information.fiscal_year,
                format_thousands(taxable_income, 2)
            ),
        );

        Ok(result)
    }

    /// Parse every upload once. Duplicates and unreadable files become audit flags.
    fn read_documents(
        &self,
        documents: &[UploadedDocument],
        audit_flags: &mut Vec<String>,
        logs: &Arc<Mutex<Vec<LogEntry>>>,
    ) -> Vec<(String, String)> {
        let mut seen: HashMap<String, &str> = HashMap::new();
        let mut readable = Vec::new();

        for document in documents {
            let fingerprint = document.fingerprint();
            if let Some(first) = seen.get(&fingerprint) {
                audit_flags.push(format!(
                    "ℹ️ {} is a duplicate of {} and was ignored.",
                    document.filename, first
                ));
                continue;
            }
            seen.insert(fingerprint, document.filename.as_str());

            match self.parser.extract_text(document) {
                Ok(text) if text.trim().is_empty() => {
                    info!(filename = %document.filename, "No text extracted, skipping");
                }
                Ok(text) => readable.push((document.filename.clone(), text)),
                Err(e) => {
                    add_log(
                        logs,
                        "WARN",
                        "Sorter",
                        &format!("Could not read {}: {}", document.filename, e),
                    );
                    audit_flags.push(format!(
                        "⚠️ {} could not be read and was skipped: {}",
                        document.filename,
                        e.detail()
                    ));
                }
            }
        }

        readable
    }

    async fn classify(&self, filename: &str, text: &str) -> Classification {
        let head = truncate_chars(text, self.classification_chars);
        match self
            .extractor
            .extract_as::<Classification>(head, CLASSIFICATION_PROMPT)
            .await
        {
            Ok(classification) => {
                info!(
                    filename,
                    document_type = ?classification.document_type,
                    "Classified document"
                );
                classification
            }
            Err(e) => {
                warn!(filename, error = %e, "Classification failed, treating as OTHER");
                Classification::unclassified()
            }
        }
    }

    fn reject(&self, logs: &Arc<Mutex<Vec<LogEntry>>>, message: String) -> AppError {
        add_log(logs, "WARN", "Sorter", &message);
        AppError::AnalysisRejected(message)
    }
}

/// `['a', 'b']`
fn list_literal(items: &BTreeSet<String>) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("'{}'", item)).collect();
    format!("[{}]", quoted.join(", "))
}
