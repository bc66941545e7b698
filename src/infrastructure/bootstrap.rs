use std::sync::{Arc, Mutex};

use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::app::AppState;
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::AnalysisRepository;
use crate::infrastructure::llm_clients::{LLMClient, RouterClient};
use crate::interfaces::http::{add_log, LogEntry};

/// `RUST_LOG` wins; otherwise the configured level applies.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn build_state(
    config: &AppConfig,
    logs: &Arc<Mutex<Vec<LogEntry>>>,
) -> Result<AppState> {
    let repository = match &config.storage.database_url {
        Some(url) => {
            let repository = AnalysisRepository::init(url).await.map_err(|err| {
                error!(error = %err, database_url = %url, "Failed to initialize analysis history");
                err
            })?;
            add_log(logs, "INFO", "System", "Analysis history enabled");
            Some(Arc::new(repository))
        }
        None => None,
    };

    let llm_client: Arc<dyn LLMClient + Send + Sync> =
        Arc::new(RouterClient::new(config.llm.request_timeout()));

    add_log(
        logs,
        "INFO",
        "System",
        &format!(
            "LLM provider {:?} at {} (model {})",
            config.llm.client.provider, config.llm.client.base_url, config.llm.client.model
        ),
    );

    Ok(AppState::new(llm_client, config, repository))
}
