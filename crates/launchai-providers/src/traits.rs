//! Completion provider trait — the one capability every LLM backend exposes.
//!
//! Providers translate the normalized `(system_prompt, turns)` pair into their
//! own wire format and report back a [`Completion`]; callers never see
//! provider-specific payloads.

use std::time::Duration;

use async_trait::async_trait;
use launchai_core::types::{Completion, Turn};

use crate::error::ProviderError;

/// Generation parameters and transport limits shared by all provider clients.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// HTTP-level request timeout.
    pub request_timeout: Duration,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4000,
            temperature: 0.7,
            request_timeout: Duration::from_secs(45),
        }
    }
}

/// Trait that all LLM providers must implement.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Stable identifier used for pricing and provenance (e.g. `"anthropic"`).
    fn name(&self) -> &str;

    /// Whether credentials are present. Unconfigured providers are skipped
    /// without being invoked.
    fn is_configured(&self) -> bool;

    /// Run one completion.
    ///
    /// `turns` never contains system turns and always ends with the new user
    /// message.
    async fn invoke(&self, system_prompt: &str, turns: &[Turn])
        -> Result<Completion, ProviderError>;
}
