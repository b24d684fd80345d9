//! Provider registry.
//!
//! Credentials are resolved once at construction, so a missing key shows up
//! at startup instead of mid-request, and an unconfigured provider can never
//! make an outbound call.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use vox_models::ProviderKind;

use crate::did::{DidConfig, DidProvider};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::VideoProvider;
use crate::runway::{RunwayConfig, RunwayProvider};
use crate::stability::{StabilityConfig, StabilityProvider};

/// Environment variable holding the credential for a provider.
fn credential_var(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Did => "DID_API_KEY",
        ProviderKind::Runway => "RUNWAY_API_KEY",
        ProviderKind::Stability => "STABILITY_API_KEY",
    }
}

/// Registry of constructed provider adapters.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn VideoProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every adapter whose credential is present in the environment.
    pub fn from_env() -> Self {
        let mut registry = Self::new();

        if let Ok(key) = std::env::var("DID_API_KEY") {
            let mut config = DidConfig::new(key);
            if let Ok(url) = std::env::var("DID_BASE_URL") {
                config.base_url = url;
            }
            match DidProvider::new(config) {
                Ok(provider) => registry.insert(Arc::new(provider)),
                Err(e) => warn!("Skipping D-ID provider: {}", e),
            }
        }

        if let Ok(key) = std::env::var("RUNWAY_API_KEY") {
            let mut config = RunwayConfig::new(key);
            if let Ok(url) = std::env::var("RUNWAY_BASE_URL") {
                config.base_url = url;
            }
            match RunwayProvider::new(config) {
                Ok(provider) => registry.insert(Arc::new(provider)),
                Err(e) => warn!("Skipping Runway provider: {}", e),
            }
        }

        if let Ok(key) = std::env::var("STABILITY_API_KEY") {
            let mut config = StabilityConfig::new(key);
            if let Ok(url) = std::env::var("STABILITY_BASE_URL") {
                config.base_url = url;
            }
            match StabilityProvider::new(config) {
                Ok(provider) => registry.insert(Arc::new(provider)),
                Err(e) => warn!("Skipping Stability provider: {}", e),
            }
        }

        info!(providers = ?registry.configured(), "Provider registry initialized");
        registry
    }

    /// Register an adapter.
    pub fn insert(&mut self, provider: Arc<dyn VideoProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    /// Get an adapter, or the configuration error for its missing credential.
    pub fn get(&self, kind: ProviderKind) -> ProviderResult<Arc<dyn VideoProvider>> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or(ProviderError::MissingCredential(credential_var(kind)))
    }

    /// Whether an adapter exists for this provider.
    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }

    /// Configured providers, in canonical order.
    pub fn configured(&self) -> Vec<ProviderKind> {
        ProviderKind::all()
            .into_iter()
            .filter(|k| self.providers.contains_key(k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_reports_missing_credential() {
        let registry = ProviderRegistry::new();
        let err = registry.get(ProviderKind::Runway).unwrap_err();

        assert!(matches!(
            err,
            ProviderError::MissingCredential("RUNWAY_API_KEY")
        ));
        assert!(!registry.is_configured(ProviderKind::Runway));
    }

    #[test]
    fn test_inserted_provider_is_returned() {
        let mut registry = ProviderRegistry::new();
        let provider = DidProvider::new(DidConfig::new("key")).unwrap();
        registry.insert(Arc::new(provider));

        assert!(registry.is_configured(ProviderKind::Did));
        assert_eq!(registry.configured(), vec![ProviderKind::Did]);
        assert_eq!(
            registry.get(ProviderKind::Did).unwrap().kind(),
            ProviderKind::Did
        );
    }
}
