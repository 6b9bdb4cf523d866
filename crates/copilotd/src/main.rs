//! Knowledge Copilot daemon

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use copilotd::config::CopilotConfig;
use copilotd::gate::ConfidenceGate;
use copilotd::ollama::{self, Generator};
use copilotd::orchestrator::Orchestrator;
use copilotd::rag::RagService;
use copilotd::responders::ResponderSet;
use copilotd::server::{self, AppState};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("copilotd v{} starting", env!("CARGO_PKG_VERSION"));

    let config = CopilotConfig::load()?;

    // The blocking HTTP client owns its own runtime, so build it before ours
    let generator: Arc<dyn Generator> = Arc::from(ollama::build_generator(&config.llm)?);
    let rag = Arc::new(RagService::new(
        generator,
        config.retrieval.chunk_size,
        config.retrieval.chunk_overlap,
    ));

    match rag.ingest_dir(&config.retrieval.data_dir) {
        Ok(stats) if stats.documents > 0 => {
            info!("Knowledge base ready: {} chunks", stats.chunks)
        }
        Ok(_) => warn!("Knowledge base is empty, POST /ingest once documents are in place"),
        Err(e) => warn!(
            "Initial ingestion from {} failed: {}",
            config.retrieval.data_dir.display(),
            e
        ),
    }

    let responders = ResponderSet::with_service(rag.clone());
    let gate = ConfidenceGate::from_config(&config.gate);
    info!("Confidence gate min_score={}", gate.min_score());
    let orchestrator = Orchestrator::new(responders, gate);

    let state = AppState::new(orchestrator, rag, &config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(server::run(state, &config))?;

    info!("copilotd stopped");
    Ok(())
}
