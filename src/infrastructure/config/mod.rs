use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::tax::TaxRegime;

pub const DEFAULT_CONFIG_FILE: &str = "taxsorter.toml";
const ENV_PREFIX: &str = "TAXSORTER_";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    #[validate(range(min = 1, max = 256))]
    pub workers: usize,
    #[validate(range(min = 1024))]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            workers: 3,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Provider settings plus the knobs of the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LlmSettings {
    #[serde(flatten)]
    #[validate(nested)]
    pub client: LLMConfig,
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    #[validate(range(min = 1, max = 10))]
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    #[validate(range(min = 100))]
    pub max_input_chars: usize,
    #[validate(range(min = 100))]
    pub classification_chars: usize,
    #[validate(range(min = 1, max = 32))]
    pub max_concurrency: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            client: LLMConfig::default(),
            request_timeout_secs: 180,
            max_retries: 3,
            retry_delay_ms: 3_000,
            max_input_chars: 32_000,
            classification_chars: 2_500,
            max_concurrency: 1,
        }
    }
}

impl LlmSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite URL for the analysis history; history is disabled when unset.
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub llm: LlmSettings,
    pub tax: TaxRegime,
    pub storage: StorageConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            llm: LlmSettings::default(),
            tax: TaxRegime::default(),
            storage: StorageConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load `.env`, then layer defaults < TOML file < deployment env < `TAXSORTER_*` env.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let path = std::env::var("TAXSORTER_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_figment(Self::figment(&path))
    }

    pub fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(deployment_env())
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["config"])
                    .split("__"),
            )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        self.tax.validate()?;

        let base_url = url::Url::parse(&self.llm.client.base_url).map_err(|e| {
            AppError::ConfigError(format!(
                "Invalid llm.base_url '{}': {}",
                self.llm.client.base_url, e
            ))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AppError::ConfigError(format!(
                "llm.base_url must be http(s), got '{}'",
                base_url.scheme()
            )));
        }
        Ok(())
    }
}

/// Plain variables set by container and process-manager deployments.
fn deployment_env() -> Env {
    Env::raw()
        .only(&["HOST", "PORT", "WEB_CONCURRENCY", "LOG_LEVEL", "OPENAI_API_KEY"])
        .map(|key| {
            let mapped = match key.as_str().to_ascii_uppercase().as_str() {
                "HOST" => "server.host",
                "PORT" => "server.port",
                "WEB_CONCURRENCY" => "server.workers",
                "OPENAI_API_KEY" => "llm.api_key",
                _ => "log_level",
            };
            mapped.into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm_config::LLMProvider;
    use figment::Jail;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.check().is_ok());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.client.model, "gpt-4-turbo");
        assert_eq!(config.llm.max_retries, 3);
    }

    #[test]
    fn test_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "taxsorter.toml",
                r#"
                    log_level = "debug"

                    [server]
                    port = 9000

                    [llm]
                    provider = "Local"
                    base_url = "http://localhost:1234/v1"
                    model = "qwen2.5"
                "#,
            )?;
            jail.set_env("WEB_CONCURRENCY", "5");
            jail.set_env("OPENAI_API_KEY", "sk-test");
            jail.set_env("TAXSORTER_SERVER__PORT", "9100");

            let config = AppConfig::from_figment(AppConfig::figment("taxsorter.toml"))
                .expect("config loads");
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.server.workers, 5);
            assert_eq!(config.log_level, "debug");
            assert_eq!(config.llm.client.provider, LLMProvider::Local);
            assert_eq!(config.llm.client.model, "qwen2.5");
            assert_eq!(config.llm.client.api_key.as_deref(), Some("sk-test"));
            assert_eq!(config.llm.max_input_chars, 32_000);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("TAXSORTER_SERVER__WORKERS", "0");
            let result = AppConfig::from_figment(AppConfig::figment("missing.toml"));
            assert!(matches!(result, Err(AppError::ConfigError(_))));
            Ok(())
        });
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let mut config = AppConfig::default();
        config.llm.client.base_url = "ftp://example.com".to_string();
        assert!(config.check().is_err());
    }
}
