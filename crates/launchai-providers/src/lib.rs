//! LLM provider layer for LaunchAI.
//!
//! # Architecture
//!
//! - [`traits::CompletionProvider`] — trait that every provider implements
//! - [`anthropic::AnthropicProvider`] — Anthropic Messages API client
//! - [`openai::OpenAiProvider`] — OpenAI-compatible `/chat/completions` client
//! - [`registry`] — static specs for the supported providers + builder from config
//! - [`error::ProviderError`] — transient failures reported back to the dispatcher

pub mod anthropic;
pub mod error;
pub mod openai;
pub mod registry;
pub mod traits;

// Re-export main types for convenience
pub use anthropic::AnthropicProvider;
pub use error::ProviderError;
pub use openai::OpenAiProvider;
pub use registry::{build_providers, ProviderEntry, ProviderSpec, WireFormat, PROVIDERS};
pub use traits::{CompletionProvider, RequestOptions};
