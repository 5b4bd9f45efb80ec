//! Application state.

use std::sync::Arc;

use anyhow::Context;

use clipline_analysis::{GeminiAnalyzer, GeminiClient};
use clipline_media::FfmpegToolchain;
use clipline_pipeline::{JobRegistry, Orchestrator, PipelineConfig};
use clipline_storage::{ArtifactStore, LocalArtifactStore};

use crate::config::ApiConfig;
use crate::publish::{Publisher, StubPublisher};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn ArtifactStore>,
    pub registry: Arc<JobRegistry>,
    pub orchestrator: Arc<Orchestrator>,
    pub publisher: Arc<dyn Publisher>,
}

impl AppState {
    /// Create new application state and spawn the orchestrator.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn ArtifactStore> = Arc::new(
            LocalArtifactStore::from_env()
                .await
                .context("creating artifact store")?,
        );

        let gemini = GeminiClient::from_env().context("creating Gemini client")?;
        let provider = Arc::new(GeminiAnalyzer::new(gemini.clone()));
        let toolchain = Arc::new(FfmpegToolchain::new(gemini));

        let registry = Arc::new(JobRegistry::new());
        let orchestrator = Orchestrator::start(
            PipelineConfig::from_env(),
            Arc::clone(&registry),
            Arc::clone(&store),
            provider,
            toolchain,
        );

        Ok(Self {
            config,
            store,
            registry,
            orchestrator,
            publisher: Arc::new(StubPublisher),
        })
    }
}
