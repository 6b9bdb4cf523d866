//! Configuration management for copilotd.
//!
//! Loads settings from /etc/copilot/config.toml (or $COPILOT_CONFIG) or uses
//! defaults. Every section is optional.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/copilot/config.toml";

/// Environment variable overriding the config path
pub const CONFIG_ENV: &str = "COPILOT_CONFIG";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Whole-request timeout, must exceed the LLM timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_request_timeout() -> u64 {
    130
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Which generation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmBackend {
    Ollama,
    /// Deterministic offline backend
    Mock,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_backend")]
    pub backend: LlmBackend,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_backend() -> LlmBackend {
    LlmBackend::Ollama
}

fn default_model() -> String {
    "gemma3:1b".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Document ingestion and retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/raw_documents")
}

fn default_chunk_size() -> usize {
    copilot_shared::knowledge::DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    copilot_shared::knowledge::DEFAULT_CHUNK_OVERLAP
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Required topic keywords for evidence from matching sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicGuard {
    /// Applies when the lower-cased source id contains this
    pub source_pattern: String,
    /// Question must contain at least one of these
    pub required_any: Vec<String>,
}

impl TopicGuard {
    pub fn new(source_pattern: &str, required_any: &[&str]) -> Self {
        Self {
            source_pattern: source_pattern.to_string(),
            required_any: required_any.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Confidence gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Score floor for the best evidence item
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Phrase in an answer that marks a retrieval miss
    #[serde(default = "default_miss_marker")]
    pub miss_marker: String,

    /// Stopwords added to the built-in set for the token-overlap check
    #[serde(default)]
    pub extra_stopwords: Vec<String>,

    /// Ordered; first guard whose pattern matches the top source applies
    #[serde(default = "default_topic_guards")]
    pub topic_guards: Vec<TopicGuard>,
}

fn default_min_score() -> f64 {
    0.20
}

fn default_miss_marker() -> String {
    "not found in knowledge base".to_string()
}

/// "leave" alone does not satisfy the annual-leave guard, so maternity and
/// paternity questions never settle on the annual-leave document.
pub fn default_topic_guards() -> Vec<TopicGuard> {
    vec![
        TopicGuard::new("hr_leave_policy", &["annual leave", "holiday", "time off", "workday"]),
        TopicGuard::new("maternity", &["maternity", "pregnan", "parental"]),
        TopicGuard::new("paternity", &["paternity", "parental"]),
        TopicGuard::new("vpn", &["vpn"]),
        TopicGuard::new("wifi", &["wifi", "wi-fi", "wireless"]),
    ]
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            miss_marker: default_miss_marker(),
            extra_stopwords: vec![],
            topic_guards: default_topic_guards(),
        }
    }
}

/// Request policy screen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Refuse questions asking for secrets or credentials
    #[serde(default)]
    pub block_sensitive: bool,
}

/// Main copilotd configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopilotConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub policy: PolicyConfig,
}

impl CopilotConfig {
    /// Load from $COPILOT_CONFIG or the system path, falling back to defaults,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_PATH));

        let mut config = if path.exists() {
            let config = Self::load_from(&path)?;
            info!("Loaded config from {}", path.display());
            config
        } else {
            warn!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("parsing config")?;
        config.validate()?;
        Ok(config)
    }

    /// `COPILOT_MOCK_LLM`, `OLLAMA_MODEL` and `DATA_DIR`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mock) = lookup("COPILOT_MOCK_LLM") {
            if mock.eq_ignore_ascii_case("true") {
                self.llm.backend = LlmBackend::Mock;
            }
        }
        if let Some(model) = lookup("OLLAMA_MODEL").filter(|m| !m.is_empty()) {
            self.llm.model = model;
        }
        if let Some(dir) = lookup("DATA_DIR").filter(|d| !d.is_empty()) {
            self.retrieval.data_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.gate.min_score.is_finite() || self.gate.min_score < 0.0 {
            return Err(anyhow!(
                "gate.min_score must be a non-negative number, got {}",
                self.gate.min_score
            ));
        }
        if self.retrieval.chunk_size == 0 {
            return Err(anyhow!("retrieval.chunk_size must be positive"));
        }
        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(anyhow!(
                "retrieval.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.retrieval.chunk_overlap,
                self.retrieval.chunk_size
            ));
        }
        if self.gate.miss_marker.trim().is_empty() {
            return Err(anyhow!("gate.miss_marker must not be empty"));
        }
        Ok(())
    }
}
