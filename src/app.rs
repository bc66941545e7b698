use std::sync::{Arc, Mutex};

use crate::application::{IntelligentSorterUseCase, ReportGenerationUseCase};
use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::AnalysisRepository;
use crate::infrastructure::llm_clients::LLMClient;
use crate::interfaces::http::{add_log, LogEntry};

/// Everything the HTTP handlers share across workers.
pub struct AppState {
    pub sorter_use_case: IntelligentSorterUseCase,
    pub report_use_case: ReportGenerationUseCase,
    pub llm_client: Arc<dyn LLMClient + Send + Sync>,
    pub llm_config: LLMConfig,
    pub repository: Option<Arc<AnalysisRepository>>,
}

impl AppState {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        config: &AppConfig,
        repository: Option<Arc<AnalysisRepository>>,
    ) -> Self {
        Self {
            sorter_use_case: IntelligentSorterUseCase::new(
                llm_client.clone(),
                &config.llm,
                config.tax.clone(),
                repository.clone(),
            ),
            report_use_case: ReportGenerationUseCase::new(repository.clone()),
            llm_client,
            llm_config: config.llm.client.clone(),
            repository,
        }
    }
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load()?;
    crate::infrastructure::bootstrap::init_tracing(&config.log_level);

    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));
    let state = crate::infrastructure::bootstrap::build_state(&config, &logs).await?;

    let server = crate::interfaces::http::start_server(Arc::new(state), logs.clone(), &config.server)?;
    add_log(
        &logs,
        "INFO",
        "System",
        &format!(
            "HTTP server listening on {}:{} ({} workers)",
            config.server.host, config.server.port, config.server.workers
        ),
    );

    server.await?;
    Ok(())
}
