//! HTTP client for copilotd.

use anyhow::{anyhow, Context, Result};
use copilot_shared::{
    AskRequest, ErrorBody, FinalResult, HealthResponse, IngestResponse, ReadyResponse,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Client for talking to copilotd
pub struct CopilotClient {
    http: reqwest::Client,
    base_url: String,
}

impl CopilotClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ask a question and decode the answer
    pub async fn ask(&self, request: &AskRequest) -> Result<FinalResult> {
        let response = self
            .http
            .post(self.url("/ask"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        decode(response).await
    }

    /// Ask a question and keep the raw status and body.
    ///
    /// Non-JSON error bodies are wrapped as `{"error": <text>}`.
    pub async fn ask_raw(&self, request: &AskRequest) -> Result<(u16, Value)> {
        let response = self
            .http
            .post(self.url("/ask"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text)
            .unwrap_or_else(|_| serde_json::json!({ "error": text }));
        Ok((status, body))
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        decode(response).await
    }

    pub async fn ready(&self) -> Result<ReadyResponse> {
        let response = self
            .http
            .get(self.url("/ready"))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        decode(response).await
    }

    pub async fn ingest(&self) -> Result<IngestResponse> {
        let response = self
            .http
            .post(self.url("/ingest"))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        decode(response).await
    }

    fn unreachable(&self, e: reqwest::Error) -> anyhow::Error {
        anyhow!(
            "Cannot reach copilotd at {}: {}\n\n\
             Is the daemon running? Start it with: copilotd",
            self.base_url,
            e
        )
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;
    debug!("HTTP {} ({} bytes)", status, text.len());

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        return Err(anyhow!("copilotd returned {}: {}", status, message));
    }

    serde_json::from_str(&text).with_context(|| format!("decoding response: {}", text))
}
