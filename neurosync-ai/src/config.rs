//! Enrichment-side configuration and gateway construction from it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assembler::EnrichmentConfig;
use crate::cache::ResponseCache;
use crate::gateway::{FailoverGateway, GatewayConfig};
use crate::provider::{ProviderClient, ProviderKind, ProviderSpec};

/// `[cache]` section. Off unless enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_hours: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_hours: 24,
            max_entries: 512,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours * 3600)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub gateway: GatewayConfig,
    pub enrichment: EnrichmentConfig,
    pub cache: CacheConfig,
    /// Priority order: first entry is tried first.
    pub providers: Vec<ProviderSpec>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            enrichment: EnrichmentConfig::default(),
            cache: CacheConfig::default(),
            providers: default_providers(),
        }
    }
}

pub fn default_providers() -> Vec<ProviderSpec> {
    vec![
        ProviderSpec::anthropic("claude-3-5-sonnet-latest"),
        ProviderSpec::openai("gpt-4o-mini"),
    ]
}

impl AiConfig {
    /// Build the production gateway. `key_for` supplies the API key per backend kind.
    pub fn gateway(&self, key_for: impl Fn(ProviderKind) -> Option<String>) -> FailoverGateway {
        let clients: Vec<ProviderClient> = self
            .providers
            .iter()
            .map(|spec| ProviderClient::from_spec(spec, key_for(spec.kind)))
            .collect();
        info!(providers = clients.len(), cache = self.cache.enabled, "gateway configured");

        let gw = FailoverGateway::new(clients, self.gateway);
        if self.cache.enabled {
            gw.with_cache(ResponseCache::new(self.cache.ttl(), self.cache.max_entries))
        } else {
            gw
        }
    }
}
