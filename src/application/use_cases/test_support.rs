use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::llm_clients::LLMClient;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type Responder = dyn Fn(&str, &str) -> Result<String> + Send + Sync;
type Latency = dyn Fn(&str, &str) -> Duration + Send + Sync;

/// Scripted model: answers each (system, user) pair through a closure.
pub struct FnLlm {
    responder: Box<Responder>,
    latency: Option<Box<Latency>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FnLlm {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            latency: None,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering, per (system, user) pair.
    pub fn with_latency<F>(mut self, latency: F) -> Self
    where
        F: Fn(&str, &str) -> Duration + Send + Sync + 'static,
    {
        self.latency = Some(Box::new(latency));
        self
    }

    /// Most requests that were ever outstanding at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMClient for FnLlm {
    async fn generate(&self, _config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = &self.latency {
            tokio::time::sleep(latency(system, user)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.responder)(system, user)
    }

    async fn list_models(&self, _config: &LLMConfig) -> Result<Vec<String>> {
        Ok(vec!["scripted-model".to_string()])
    }
}
