//! Anthropic Messages API client.
//!
//! `POST {api_base}/messages` with `x-api-key` auth. The system prompt goes in
//! the top-level `system` field; only `user`/`assistant` turns are sent as
//! messages.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use launchai_core::types::{Completion, Role, Turn};

use crate::error::{check_status, ProviderError};
use crate::registry::{ProviderConfig, ProviderSpec};
use crate::traits::{CompletionProvider, RequestOptions};

const ANTHROPIC_VERSION: &str = "2023-06-01";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

// ─────────────────────────────────────────────
// AnthropicProvider
// ─────────────────────────────────────────────

/// A provider that talks to the Anthropic Messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    extra_headers: HeaderMap,
    max_tokens: u32,
    temperature: f64,
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(
        config: &ProviderConfig,
        spec: &'static ProviderSpec,
        options: &RequestOptions,
    ) -> Result<Self, ProviderError> {
        let mut extra_headers = HeaderMap::new();
        extra_headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        if let Some(ref headers) = config.extra_headers {
            for (key, value) in headers {
                match (
                    HeaderName::from_bytes(key.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    (Ok(name), Ok(val)) => {
                        extra_headers.insert(name, val);
                    }
                    _ => warn!("Invalid header: {}={}", key, value),
                }
            }
        }

        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()?;

        Ok(AnthropicProvider {
            client,
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| spec.default_api_base.to_string()),
            api_key: config.api_key.trim().to_string(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| spec.default_model.to_string()),
            extra_headers,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            spec,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.api_base.trim_end_matches('/'))
    }

    fn build_request<'a>(
        &'a self,
        system_prompt: &'a str,
        turns: &'a [Turn],
    ) -> MessagesRequest<'a> {
        // The Messages API requires the first message to come from the user.
        let messages = turns
            .iter()
            .filter(|t| !t.is_system())
            .skip_while(|t| t.role != Role::User)
            .map(|t| WireMessage {
                role: t.role.as_str(),
                content: &t.content,
            })
            .collect();

        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system_prompt,
            messages,
        }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn invoke(
        &self,
        system_prompt: &str,
        turns: &[Turn],
    ) -> Result<Completion, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured);
        }

        debug!(
            provider = self.spec.display_name,
            model = %self.model,
            turns = turns.len(),
            "Calling LLM"
        );

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .headers(self.extra_headers.clone())
            .json(&self.build_request(system_prompt, turns))
            .send()
            .await
            .map_err(|e| {
                error!(provider = self.spec.display_name, error = %e, "HTTP request failed");
                ProviderError::Http(e)
            })?;

        let response = check_status(response).await.map_err(|e| {
            error!(provider = self.spec.display_name, error = %e, "API error");
            e
        })?;

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let text = body
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            return Err(ProviderError::Malformed(
                "no text content in response".into(),
            ));
        }

        let (input_tokens, output_tokens) = body
            .usage
            .map_or((0, 0), |u| (u.input_tokens, u.output_tokens));

        debug!(
            provider = self.spec.display_name,
            input_tokens, output_tokens, "LLM response received"
        );

        Ok(Completion {
            text,
            input_tokens,
            output_tokens,
            model: body.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
