//! OpenAI-compatible chat completions client.
//!
//! Talks to any `/chat/completions` endpoint that follows the OpenAI schema
//! (OpenAI itself, Azure-style proxies, local gateways). The system prompt is
//! sent as a leading `system` message.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use launchai_core::types::{Completion, Turn};

use crate::error::{check_status, ProviderError};
use crate::registry::{ProviderConfig, ProviderSpec};
use crate::traits::{CompletionProvider, RequestOptions};

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// ─────────────────────────────────────────────
// OpenAiProvider
// ─────────────────────────────────────────────

/// A provider that talks to an OpenAI-compatible HTTP API.
pub struct OpenAiProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    model: String,
    /// Extra headers to send with each request.
    extra_headers: HeaderMap,
    max_tokens: u32,
    temperature: f64,
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("provider", &self.spec.display_name)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a new provider from a config section and its registry spec.
    pub fn new(
        config: &ProviderConfig,
        spec: &'static ProviderSpec,
        options: &RequestOptions,
    ) -> Result<Self, ProviderError> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| spec.default_api_base.to_string());

        let mut extra_headers = HeaderMap::new();
        if let Some(ref headers) = config.extra_headers {
            for (key, value) in headers {
                if let (Ok(name), Ok(val)) = (
                    HeaderName::from_bytes(key.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    extra_headers.insert(name, val);
                } else {
                    warn!("Invalid header: {}={}", key, value);
                }
            }
        }

        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()?;

        Ok(OpenAiProvider {
            client,
            api_base,
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

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    fn build_request<'a>(&'a self, system_prompt: &'a str, turns: &'a [Turn]) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(ChatMessage {
            role: "system",
            content: system_prompt,
        });
        messages.extend(turns.iter().map(|t| ChatMessage {
            role: t.role.as_str(),
            content: &t.content,
        }));

        ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
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
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
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

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::Malformed("no message content in choices".into()))?;

        let (input_tokens, output_tokens) = body
            .usage
            .map_or((0, 0), |u| (u.prompt_tokens, u.completion_tokens));

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::find_by_name;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(api_key: &str, api_base: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            api_key: api_key.to_string(),
            api_base: api_base.map(String::from),
            ..Default::default()
        }
    }

    fn make_provider(config: &ProviderConfig) -> OpenAiProvider {
        let spec = find_by_name("openai").unwrap();
        OpenAiProvider::new(config, spec, &RequestOptions::default()).unwrap()
    }

    // ── Unit tests ──

    #[test]
    fn test_completions_url_trailing_slash() {
        let provider = make_provider(&make_config("key", Some("https://api.openai.com/v1/")));
        assert_eq!(
            provider.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_default_api_base_and_model() {
        let provider = make_provider(&make_config("key", None));
        assert_eq!(provider.api_base, "https://api.openai.com/v1");
        assert_eq!(provider.model, "gpt-4o");
    }

    #[test]
    fn test_model_override() {
        let config = ProviderConfig {
            api_key: "key".into(),
            model: Some("gpt-4o-mini".into()),
            ..Default::default()
        };
        assert_eq!(make_provider(&config).model, "gpt-4o-mini");
    }

    #[test]
    fn test_is_configured() {
        assert!(make_provider(&make_config("key", None)).is_configured());
        assert!(!make_provider(&make_config("", None)).is_configured());
        assert!(!make_provider(&make_config("  ", None)).is_configured());
    }

    #[test]
    fn test_extra_headers() {
        let mut headers = HashMap::new();
        headers.insert("X-Org".to_string(), "launch".to_string());
        let config = ProviderConfig {
            api_key: "key".to_string(),
            extra_headers: Some(headers),
            ..Default::default()
        };
        assert!(make_provider(&config).extra_headers.contains_key("x-org"));
    }

    #[test]
    fn test_system_prompt_leads_messages() {
        let provider = make_provider(&make_config("key", None));
        let turns = vec![Turn::user("Hi"), Turn::assistant("Hello"), Turn::user("Plan?")];
        let req = provider.build_request("You are LaunchAI.", &turns);
        let json = serde_json::to_value(&req).unwrap();
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "You are LaunchAI.");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["content"], "Plan?");
    }

    // ── Integration tests with mock server ──

    #[tokio::test]
    async fn test_invoke_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key-123"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "max_tokens": 4000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-test",
                "model": "gpt-4o-2024-08-06",
                "choices": [{
                    "message": { "role": "assistant", "content": "Focus on LinkedIn." },
                    "finish_reason": "stop"
                }],
                "usage": {
                    "prompt_tokens": 42,
                    "completion_tokens": 7,
                    "total_tokens": 49
                }
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&make_config("test-key-123", Some(&mock_server.uri())));
        let completion = provider
            .invoke("You are LaunchAI.", &[Turn::user("Where should I advertise?")])
            .await
            .unwrap();

        assert_eq!(completion.text, "Focus on LinkedIn.");
        assert_eq!(completion.input_tokens, 42);
        assert_eq!(completion.output_tokens, 7);
        assert_eq!(completion.model, "gpt-4o-2024-08-06");
    }

    #[tokio::test]
    async fn test_invoke_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {
                    "message": "Rate limit exceeded",
                    "type": "rate_limit_error"
                }
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&make_config("key", Some(&mock_server.uri())));
        let err = provider.invoke("sys", &[Turn::user("Hello")]).await.unwrap_err();

        match err {
            ProviderError::Status { status, ref message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_invoke_empty_choices_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-empty",
                "choices": []
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&make_config("key", Some(&mock_server.uri())));
        let err = provider.invoke("sys", &[Turn::user("Hello")]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_invoke_non_json_body_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&make_config("key", Some(&mock_server.uri())));
        let err = provider.invoke("sys", &[Turn::user("Hello")]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_invoke_network_error() {
        // Point to a port that's not listening
        let provider = make_provider(&make_config("key", Some("http://127.0.0.1:1")));
        let err = provider.invoke("sys", &[Turn::user("Hello")]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Http(_)));
    }

    #[tokio::test]
    async fn test_invoke_unconfigured() {
        let provider = make_provider(&make_config("", None));
        let err = provider.invoke("sys", &[Turn::user("Hello")]).await.unwrap_err();
        assert!(err.is_configuration_absent());
    }
}
