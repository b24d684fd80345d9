//! Application state.

use std::sync::Arc;

use vox_engine::Orchestrator;
use vox_providers::ProviderRegistry;
use vox_records::{ClipStore, GenerationStore, RecordsClient};
use vox_storage::{ArtifactSink, S3Vault};

use crate::auth::TokenVerifier;
use crate::config::ApiConfig;
use crate::middleware::RateLimiterCache;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub clips: Arc<dyn ClipStore>,
    pub generations: Arc<dyn GenerationStore>,
    pub providers: Arc<ProviderRegistry>,
    pub orchestrator: Arc<Orchestrator>,
    pub verifier: Arc<TokenVerifier>,
    pub limiter: RateLimiterCache,
}

impl AppState {
    /// Create application state from the environment.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let records = RecordsClient::from_env()?;
        let clips: Arc<dyn ClipStore> = Arc::new(records.clone());
        let generations: Arc<dyn GenerationStore> = Arc::new(records);

        let vault: Arc<dyn ArtifactSink> = Arc::new(S3Vault::from_env().await?);
        let providers = Arc::new(ProviderRegistry::from_env());
        let verifier = Arc::new(TokenVerifier::from_env()?);

        Ok(Self::from_parts(
            config, clips, generations, vault, providers, verifier,
        ))
    }

    /// Assemble state from explicit parts (tests, alternative stores).
    pub fn from_parts(
        config: ApiConfig,
        clips: Arc<dyn ClipStore>,
        generations: Arc<dyn GenerationStore>,
        vault: Arc<dyn ArtifactSink>,
        providers: Arc<ProviderRegistry>,
        verifier: Arc<TokenVerifier>,
    ) -> Self {
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&clips),
            Arc::clone(&generations),
            vault,
            Arc::clone(&providers),
        ));
        let limiter = RateLimiterCache::new(config.rate_limit_rps);

        Self {
            config,
            clips,
            generations,
            providers,
            orchestrator,
            verifier,
            limiter,
        }
    }
}
