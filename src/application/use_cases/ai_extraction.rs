use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::config::LlmSettings;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::{clean_llm_response, extract_json_payload};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Runs a prompt against document text and returns the JSON object the
/// model answered with, retrying transient failures.
pub struct AiExtractor {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    config: LLMConfig,
    max_retries: u32,
    retry_delay: Duration,
    max_input_chars: usize,
}

impl AiExtractor {
    pub fn new(llm_client: Arc<dyn LLMClient + Send + Sync>, settings: &LlmSettings) -> Self {
        Self {
            llm_client,
            config: settings.client.clone(),
            max_retries: settings.max_retries.max(1),
            retry_delay: settings.retry_delay(),
            max_input_chars: settings.max_input_chars,
        }
    }

    pub async fn extract(&self, text: &str, prompt: &str) -> Result<Value> {
        let input = truncate_chars(text, self.max_input_chars);
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, chars = input.len(), "Running AI extraction");

            match self.attempt(input, prompt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempts >= self.max_retries => {
                    warn!(attempt = attempts, error = %e, "AI extraction failed, giving up");
                    return Err(AppError::LLMError(format!(
                        "AI extraction failed after {} attempts: {}",
                        attempts,
                        e.detail()
                    )));
                }
                Err(e) => {
                    warn!(attempt = attempts, error = %e, "AI extraction attempt failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    pub async fn extract_as<T: DeserializeOwned>(&self, text: &str, prompt: &str) -> Result<T> {
        let value = self.extract(text, prompt).await?;
        serde_json::from_value(value)
            .map_err(|e| AppError::ParseError(format!("Unexpected extraction shape: {}", e)))
    }

    async fn attempt(&self, text: &str, prompt: &str) -> Result<Value> {
        let raw = self.llm_client.generate(&self.config, prompt, text).await?;
        let cleaned = clean_llm_response(&raw);
        let payload = extract_json_payload(&cleaned);
        match serde_json::from_str::<Value>(&payload) {
            Ok(value @ Value::Object(_)) => Ok(value),
            Ok(_) => Err(AppError::ParseError(
                "Model reply is not a JSON object".to_string(),
            )),
            Err(e) => Err(AppError::ParseError(format!(
                "Model reply is not valid JSON: {}",
                e
            ))),
        }
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Interpret a model-reported figure as an amount; anything unreadable is 0.
pub fn amount(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => parse_amount(text).unwrap_or(0.0),
        _ => 0.0,
    }
}

fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        if value.is_finite() {
            return Some(value);
        }
    }

    let first_digit = trimmed.find(|ch: char| ch.is_ascii_digit())?;
    let negative = trimmed[..first_digit].contains('-')
        || (trimmed.starts_with('(') && trimmed.ends_with(')'));
    let mut digits: String = trimmed[first_digit..]
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == ',')
        .collect();

    let last_dot = digits.rfind('.');
    let last_comma = digits.rfind(',');
    digits = match (last_dot, last_comma) {
        // 1.234,56
        (Some(dot), Some(comma)) if comma > dot => digits.replace('.', "").replace(',', "."),
        // 1,234.56
        (Some(_), Some(_)) => digits.replace(',', ""),
        // 1,234 or 12,5
        (None, Some(comma)) => {
            let decimals = digits.len() - comma - 1;
            if decimals == 3 {
                digits.replace(',', "")
            } else {
                digits.replace(',', ".")
            }
        }
        // 1.234.567
        (Some(_), None) if digits.matches('.').count() > 1 => digits.replace('.', ""),
        _ => digits,
    };

    let value: f64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}
