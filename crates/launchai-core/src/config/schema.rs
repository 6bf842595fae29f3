//! Configuration schema.
//!
//! Hierarchy: `Config` → `ProvidersConfig`, `DispatchConfig`, pricing table,
//! `ServerConfig`, `StorageConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.launchai/config.json` + env vars.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub dispatch: DispatchConfig,
    /// Per-provider token prices, keyed by provider name.
    pub pricing: HashMap<String, ProviderRates>,
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: ProvidersConfig::default(),
            dispatch: DispatchConfig::default(),
            pricing: default_pricing(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single LLM provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication. Empty means "not configured".
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Model override (defaults to the registry's model for this provider).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Fallback priority override; lower is tried first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    /// Disabled providers are left out of the fallback order entirely.
    pub enabled: bool,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: None,
            priority: None,
            enabled: true,
            extra_headers: None,
        }
    }
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// All provider configurations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub anthropic: ProviderConfig,
    pub openai: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by name (e.g. `"anthropic"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "anthropic" => Some(&self.anthropic),
            "openai" => Some(&self.openai),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────
// Dispatch policy
// ─────────────────────────────────────────────

/// Fallback timing and generation parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchConfig {
    /// Delay before trying the next provider after a failure.
    pub backoff_ms: u64,
    /// Upper bound for a single provider invocation.
    pub timeout_secs: u64,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            backoff_ms: 1000,
            timeout_secs: 45,
            max_tokens: 4000,
            temperature: 0.7,
        }
    }
}

impl DispatchConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Per-call timeout, never below [`MIN_TIMEOUT_SECS`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(MIN_TIMEOUT_SECS))
    }
}

/// Smallest usable per-call timeout; `0` would fail every invocation.
pub const MIN_TIMEOUT_SECS: u64 = 1;

// ─────────────────────────────────────────────
// Pricing
// ─────────────────────────────────────────────

/// Token prices for one provider, in currency units per 1000 tokens.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRates {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

/// Built-in price list. Configured rates are merged over it by the loader,
/// so a `pricing` section only needs the providers it changes.
pub fn default_pricing() -> HashMap<String, ProviderRates> {
    HashMap::from([
        (
            "anthropic".to_string(),
            ProviderRates {
                input_per_1k: 0.003,
                output_per_1k: 0.015,
            },
        ),
        (
            "openai".to_string(),
            ProviderRates {
                input_per_1k: 0.0025,
                output_per_1k: 0.01,
            },
        ),
    ])
}

// ─────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────

/// HTTP server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ─────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────

/// Conversation persistence settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Record conversations and usage to disk.
    pub enabled: bool,
    /// Directory for conversation files (defaults to `~/.launchai/conversations`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversations_dir: Option<String>,
    /// How many stored turns are replayed as history.
    pub max_history_turns: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            conversations_dir: None,
            max_history_turns: 20,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
