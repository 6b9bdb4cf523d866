//! Text generation backends - Ollama over HTTP, plus a deterministic mock.
//!
//! Calls are blocking; the server runs them on tokio's blocking pool.

use copilot_shared::{CopilotError, Result};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{LlmBackend, LlmConfig};

/// `complete(prompt) -> text`
pub trait Generator: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Err when the backend cannot serve requests yet
    fn check_ready(&self) -> Result<()>;
}

/// Build the configured backend
pub fn build_generator(config: &LlmConfig) -> Result<Box<dyn Generator>> {
    match config.backend {
        LlmBackend::Ollama => {
            info!("Using Ollama at {} with model {}", config.base_url, config.model);
            Ok(Box::new(OllamaGenerator::new(
                &config.base_url,
                &config.model,
                config.timeout_secs,
            )?))
        }
        LlmBackend::Mock => {
            info!("Using mock generator");
            Ok(Box::new(MockGenerator))
        }
    }
}

pub struct OllamaGenerator {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CopilotError::Generation(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

impl Generator for OllamaGenerator {
    fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        });

        debug!("Ollama generate: model={} prompt_bytes={}", self.model, prompt.len());

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .map_err(|e| CopilotError::Generation(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(CopilotError::Generation(format!(
                "Ollama request failed: {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| CopilotError::Generation(format!("Ollama response unreadable: {}", e)))?;

        Ok(json
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .to_string())
    }

    fn check_ready(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .map_err(|e| CopilotError::Generation(format!("Ollama unreachable: {}", e)))?;

        let json: serde_json::Value = response
            .json()
            .map_err(|e| CopilotError::Generation(format!("Ollama tags unreadable: {}", e)))?;

        let has_model = json
            .get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models.iter().any(|m| {
                    m.get("name")
                        .and_then(|n| n.as_str())
                        .map(|n| n.starts_with(&self.model))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);

        if has_model {
            Ok(())
        } else {
            Err(CopilotError::Generation(format!(
                "model {} not pulled",
                self.model
            )))
        }
    }
}

/// Offline backend: answers with the first context line, or the miss marker
/// when the prompt carries no context.
pub struct MockGenerator;

impl Generator for MockGenerator {
    fn complete(&self, prompt: &str) -> Result<String> {
        let first_context_line = prompt
            .split_once("Context:\n")
            .and_then(|(_, rest)| rest.lines().next())
            .map(str::trim)
            .filter(|l| !l.is_empty());

        Ok(match first_context_line {
            Some(line) => format!("Summary: {}\nSteps:\n- {}\nDone.", line, line),
            None => "Not found in knowledge base. Which system are you asking about?".to_string(),
        })
    }

    fn check_ready(&self) -> Result<()> {
        Ok(())
    }
}
