//! Worker registry: the configured set of redundant classifier backends.
//!
//! A worker is one (provider, model, persona) combination capable of
//! performing the classification call. The registry is an explicit,
//! injected, read-only configuration object — never process-wide global
//! state — so tests can substitute fake registries freely.
//!
//! Connection configs resolve per provider from environment variables:
//!
//! ```text
//! FLASHNOTE_<PROVIDER>_BASE_URL   e.g. FLASHNOTE_MOONSHOT_BASE_URL
//! FLASHNOTE_<PROVIDER>_API_KEY
//! ```
//!
//! A worker whose provider has no resolvable connection is unusable and
//! is skipped during selection.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Computing providers the gateway can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    AliyunBailian,
    Zhipu,
    Moonshot,
    Siliconflow,
    Deepseek,
}

impl Provider {
    /// Every known provider, in registry order.
    pub const ALL: [Provider; 5] = [
        Provider::AliyunBailian,
        Provider::Zhipu,
        Provider::Moonshot,
        Provider::Siliconflow,
        Provider::Deepseek,
    ];

    /// Stable identifier used in logs and stored provenance.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::AliyunBailian => "aliyun-bailian",
            Provider::Zhipu => "zhipu",
            Provider::Moonshot => "moonshot",
            Provider::Siliconflow => "siliconflow",
            Provider::Deepseek => "deepseek",
        }
    }

    /// Fragment used in environment variable names.
    fn env_fragment(&self) -> &'static str {
        match self {
            Provider::AliyunBailian => "ALIYUN_BAILIAN",
            Provider::Zhipu => "ZHIPU",
            Provider::Moonshot => "MOONSHOT",
            Provider::Siliconflow => "SILICONFLOW",
            Provider::Deepseek => "DEEPSEEK",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Worker descriptor
// ---------------------------------------------------------------------------

/// One configured classifier backend. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerDescriptor {
    pub provider: Provider,
    pub model: String,
    /// Persona recorded in provenance (e.g. "kimi", "zhipu").
    pub persona: String,
    #[serde(default)]
    pub supports_streaming: bool,
}

impl WorkerDescriptor {
    pub fn new(
        provider: Provider,
        model: impl Into<String>,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            persona: persona.into(),
            supports_streaming: false,
        }
    }
}

/// Connection parameters for one provider's endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub base_url: String,
    pub api_key: String,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The injected worker pool plus per-provider connection configs.
#[derive(Debug, Clone, Default)]
pub struct WorkerRegistry {
    workers: Vec<WorkerDescriptor>,
    connections: HashMap<Provider, ConnectionConfig>,
}

impl WorkerRegistry {
    /// Create a registry over the given workers with no connections.
    pub fn new(workers: Vec<WorkerDescriptor>) -> Self {
        Self {
            workers,
            connections: HashMap::new(),
        }
    }

    /// Register a provider connection.
    pub fn with_connection(mut self, provider: Provider, config: ConnectionConfig) -> Self {
        self.connections.insert(provider, config);
        self
    }

    /// Build the default registry, resolving connections from the
    /// environment. Providers with missing or empty variables simply get
    /// no connection; their workers are skipped at selection time.
    pub fn from_env() -> Self {
        let mut registry = Self::new(default_workers());

        for provider in Provider::ALL {
            let fragment = provider.env_fragment();
            let base_url = std::env::var(format!("FLASHNOTE_{}_BASE_URL", fragment)).ok();
            let api_key = std::env::var(format!("FLASHNOTE_{}_API_KEY", fragment)).ok();

            match (base_url, api_key) {
                (Some(base_url), Some(api_key)) if !base_url.is_empty() && !api_key.is_empty() => {
                    debug!(provider = %provider, "resolved provider connection");
                    registry
                        .connections
                        .insert(provider, ConnectionConfig { base_url, api_key });
                }
                _ => {}
            }
        }

        info!(
            workers = registry.workers.len(),
            providers = registry.connections.len(),
            "worker registry initialized from environment"
        );
        registry
    }

    pub fn workers(&self) -> &[WorkerDescriptor] {
        &self.workers
    }

    /// Connection for a provider, if configured.
    pub fn connection(&self, provider: Provider) -> Option<&ConnectionConfig> {
        self.connections.get(&provider)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Default worker table
// ---------------------------------------------------------------------------

/// The built-in pool of fast classification workers: several
/// interchangeable models per provider, so partial provider outages only
/// shrink the pool.
pub fn default_workers() -> Vec<WorkerDescriptor> {
    vec![
        WorkerDescriptor::new(Provider::AliyunBailian, "qwen3-max-preview", "tongyi-qwen"),
        WorkerDescriptor::new(Provider::AliyunBailian, "qwen-plus-2025-09-11", "tongyi-qwen"),
        WorkerDescriptor::new(Provider::AliyunBailian, "qwen-plus-2025-07-14", "tongyi-qwen"),
        WorkerDescriptor::new(Provider::AliyunBailian, "qwen-plus-2025-07-28", "tongyi-qwen"),
        WorkerDescriptor::new(
            Provider::AliyunBailian,
            "qwen3-235b-a22b-instruct-2507",
            "tongyi-qwen",
        ),
        WorkerDescriptor::new(Provider::Zhipu, "glm-4.5-x", "zhipu"),
        WorkerDescriptor::new(Provider::Zhipu, "glm-4.6", "zhipu"),
        WorkerDescriptor::new(Provider::Zhipu, "glm-4.5-airx", "zhipu"),
        WorkerDescriptor::new(Provider::Moonshot, "kimi-k2-0905-preview", "kimi"),
        WorkerDescriptor::new(Provider::Moonshot, "kimi-k2-turbo-preview", "kimi"),
        WorkerDescriptor::new(
            Provider::Siliconflow,
            "moonshotai/Kimi-K2-Instruct-0905",
            "kimi",
        ),
        WorkerDescriptor::new(Provider::Siliconflow, "moonshotai/Kimi-K2-Instruct", "kimi"),
        WorkerDescriptor::new(
            Provider::Siliconflow,
            "Qwen/Qwen3-235B-A22B-Instruct-2507",
            "tongyi-qwen",
        ),
        WorkerDescriptor::new(Provider::Siliconflow, "zai-org/GLM-4.6", "zhipu"),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_ids_are_kebab_case() {
        assert_eq!(Provider::AliyunBailian.as_str(), "aliyun-bailian");
        assert_eq!(Provider::Deepseek.to_string(), "deepseek");
    }

    #[test]
    fn provider_serde_round_trip() {
        let json = serde_json::to_string(&Provider::AliyunBailian).unwrap();
        assert_eq!(json, "\"aliyun-bailian\"");
        let back: Provider = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Provider::AliyunBailian);
    }

    #[test]
    fn default_workers_cover_four_providers() {
        let workers = default_workers();
        assert!(workers.len() >= 10);

        let mut providers: Vec<Provider> = workers.iter().map(|w| w.provider).collect();
        providers.dedup();
        assert!(providers.contains(&Provider::AliyunBailian));
        assert!(providers.contains(&Provider::Zhipu));
        assert!(providers.contains(&Provider::Moonshot));
        assert!(providers.contains(&Provider::Siliconflow));
    }

    #[test]
    fn connection_lookup() {
        let registry = WorkerRegistry::new(default_workers()).with_connection(
            Provider::Zhipu,
            ConnectionConfig {
                base_url: "https://open.example.cn/api/paas/v4".to_string(),
                api_key: "test-key".to_string(),
            },
        );

        assert!(registry.connection(Provider::Zhipu).is_some());
        assert!(registry.connection(Provider::Moonshot).is_none());
    }

    #[test]
    fn empty_registry() {
        let registry = WorkerRegistry::new(vec![]);
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}
