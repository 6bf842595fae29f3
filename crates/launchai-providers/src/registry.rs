//! Provider registry — static specs for the supported LLM providers.
//!
//! Each `ProviderSpec` describes how to reach a provider: wire format,
//! env var, default API base and model, and its default fallback priority.
//! [`build_providers`] turns a config section into ordered provider handles.

use std::sync::Arc;

use tracing::debug;

use crate::anthropic::AnthropicProvider;
use crate::error::ProviderError;
use crate::openai::OpenAiProvider;
use crate::traits::{CompletionProvider, RequestOptions};

/// Provider config lives in core.
pub use launchai_core::config::schema::{ProviderConfig, ProvidersConfig};

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Request/response schema spoken by a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    /// Anthropic Messages API (`POST /messages`).
    AnthropicMessages,
    /// OpenAI-compatible chat completions (`POST /chat/completions`).
    OpenAiChat,
}

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name, also the pricing key (e.g. `"anthropic"`).
    pub name: &'static str,
    /// Human-readable name for logs and status output.
    pub display_name: &'static str,
    /// Conventional environment variable holding the API key.
    pub env_key: &'static str,
    pub wire: WireFormat,
    pub default_api_base: &'static str,
    pub default_model: &'static str,
    /// Fallback priority when the config does not override it (lower first).
    pub priority: u32,
}

/// Supported providers, in default fallback order.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "anthropic",
        display_name: "Anthropic",
        env_key: "ANTHROPIC_API_KEY",
        wire: WireFormat::AnthropicMessages,
        default_api_base: "https://api.anthropic.com/v1",
        default_model: "claude-3-5-sonnet-20241022",
        priority: 0,
    },
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI",
        env_key: "OPENAI_API_KEY",
        wire: WireFormat::OpenAiChat,
        default_api_base: "https://api.openai.com/v1",
        default_model: "gpt-4o",
        priority: 1,
    },
];

/// Find a provider spec by exact name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

// ─────────────────────────────────────────────
// Building provider handles
// ─────────────────────────────────────────────

/// A provider handle together with its effective fallback priority.
#[derive(Clone)]
pub struct ProviderEntry {
    pub priority: u32,
    pub provider: Arc<dyn CompletionProvider>,
}

impl ProviderEntry {
    pub fn new(priority: u32, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { priority, provider }
    }
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("name", &self.provider.name())
            .field("priority", &self.priority)
            .field("configured", &self.provider.is_configured())
            .finish()
    }
}

/// Construct one handle per enabled provider, sorted by effective priority.
///
/// Unconfigured providers are still built so the dispatcher can skip them
/// explicitly; only `enabled: false` removes a provider from the order.
/// Ties keep registry order.
pub fn build_providers(
    config: &ProvidersConfig,
    options: &RequestOptions,
) -> Result<Vec<ProviderEntry>, ProviderError> {
    let mut entries = Vec::new();

    for spec in PROVIDERS {
        let Some(provider_config) = config.get_by_name(spec.name) else {
            continue;
        };
        if !provider_config.enabled {
            debug!(provider = spec.name, "provider disabled in config");
            continue;
        }

        let provider: Arc<dyn CompletionProvider> = match spec.wire {
            WireFormat::AnthropicMessages => {
                Arc::new(AnthropicProvider::new(provider_config, spec, options)?)
            }
            WireFormat::OpenAiChat => Arc::new(OpenAiProvider::new(provider_config, spec, options)?),
        };
        let priority = provider_config.priority.unwrap_or(spec.priority);

        debug!(
            provider = spec.name,
            priority,
            configured = provider.is_configured(),
            "registered provider"
        );
        entries.push(ProviderEntry::new(priority, provider));
    }

    entries.sort_by_key(|e| e.priority);
    Ok(entries)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
