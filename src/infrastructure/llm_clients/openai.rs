use super::{endpoint, LLMClient};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use async_trait::async_trait;
use serde_json::json;

/// Client for any OpenAI-compatible chat completion API (OpenAI, OpenRouter,
/// LM Studio and friends).
pub struct OpenAIClient {
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn with_http(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn api_key(config: &LLMConfig) -> Result<Option<String>> {
        match (&config.provider, &config.api_key) {
            (_, Some(key)) if !key.trim().is_empty() => Ok(Some(key.clone())),
            (LLMProvider::Local, _) => Ok(None),
            _ => Err(AppError::LLMError(format!(
                "Missing API key for {:?}",
                config.provider
            ))),
        }
    }

    pub(crate) fn request_body(config: &LLMConfig, system: &str, user: &str) -> serde_json::Value {
        let mut body = json!({
            "model": config.model,
            "messages": [
                {
                    "role": "system",
                    "content": system
                },
                {
                    "role": "user",
                    "content": user
                }
            ],
        });
        if let Some(max_tokens) = config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = config.temperature {
            body["temperature"] = json!(temperature);
        }
        if config.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        let url = endpoint(&config.base_url, "chat/completions");
        let body = Self::request_body(config, system, user);

        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = Self::api_key(config)? {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::LLMError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLMError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| AppError::LLMError("Invalid response format".to_string()))
    }

    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>> {
        let url = endpoint(&config.base_url, "models");

        let mut request = self.client.get(&url);
        if let Some(api_key) = Self::api_key(config)? {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::LLMError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLMError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        let models = json["data"]
            .as_array()
            .ok_or_else(|| {
                AppError::LLMError("Invalid response format: missing data array".to_string())
            })?
            .iter()
            .filter_map(|m| m["id"].as_str())
            .map(|id| id.to_string())
            .collect();

        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_json_mode() {
        let config = LLMConfig::default();
        let body = OpenAIClient::request_body(&config, "sys", "user text");
        assert_eq!(body["model"], "gpt-4-turbo");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user text");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["temperature"], 0.0);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_request_body_without_json_mode() {
        let config = LLMConfig {
            json_mode: false,
            max_tokens: Some(256),
            ..LLMConfig::default()
        };
        let body = OpenAIClient::request_body(&config, "sys", "user");
        assert!(body.get("response_format").is_none());
        assert_eq!(body["max_tokens"], 256);
    }

    #[test]
    fn test_api_key_required_for_hosted_providers() {
        let config = LLMConfig::default();
        assert!(OpenAIClient::api_key(&config).is_err());

        let local = LLMConfig {
            provider: LLMProvider::Local,
            ..LLMConfig::default()
        };
        assert_eq!(OpenAIClient::api_key(&local).unwrap(), None);
    }
}
