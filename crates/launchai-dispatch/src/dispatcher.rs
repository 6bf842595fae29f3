//! The dispatcher — one best-effort AI response per call.
//!
//! Providers are tried one at a time in ascending priority order:
//!
//! ```text
//! Init → TryingProvider(i) → Succeeded
//!                          → TryingProvider(i + 1)   (skip, or failure + backoff)
//!                          → AllExhausted
//! ```
//!
//! The first success wins. Unconfigured providers are skipped without delay;
//! failures (HTTP errors, bad payloads, timeouts) are recorded and followed
//! by a fixed backoff before the next configured provider is tried. The
//! outcome is always a [`DispatchResult`], never an error.

use std::time::Duration;

use tracing::{debug, info, warn};

use launchai_core::config::{Config, DispatchConfig};
use launchai_core::types::{AttemptOutcome, AttemptRecord, DispatchRequest, DispatchResult, Usage};
use launchai_providers::{build_providers, ProviderEntry, ProviderError, RequestOptions};

use crate::pricing::PriceTable;
use crate::prompt::{assemble_turns, build_system_prompt};

// ─────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────

/// Timing knobs for the fallback loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Wait after a provider failure before trying the next one.
    pub backoff: Duration,
    /// Upper bound for a single provider invocation.
    pub timeout: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(1),
            timeout: Duration::from_secs(45),
        }
    }
}

impl From<&DispatchConfig> for DispatchPolicy {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            backoff: config.backoff(),
            timeout: config.timeout(),
        }
    }
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

/// Ordered multi-provider completion dispatcher.
///
/// Holds only read-only state after construction, so one instance can be
/// shared (`Arc<Dispatcher>`) across any number of concurrent requests.
pub struct Dispatcher {
    providers: Vec<ProviderEntry>,
    prices: PriceTable,
    policy: DispatchPolicy,
}

impl Dispatcher {
    /// Create a dispatcher over injected provider handles.
    ///
    /// Providers are ordered by ascending priority once, here; ties keep the
    /// order they were passed in. Providers without rates are reported once,
    /// since their completions will be costed at zero.
    pub fn new(mut providers: Vec<ProviderEntry>, prices: PriceTable, policy: DispatchPolicy) -> Self {
        providers.sort_by_key(|e| e.priority);
        let dispatcher = Dispatcher {
            providers,
            prices,
            policy,
        };
        for name in dispatcher.unpriced_providers() {
            warn!(provider = name, "no pricing configured; usage cost will be reported as 0");
        }
        dispatcher
    }

    /// Build providers, prices, and policy from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let options = RequestOptions {
            max_tokens: config.dispatch.max_tokens,
            temperature: config.dispatch.temperature,
            request_timeout: config.dispatch.timeout(),
        };
        let providers = build_providers(&config.providers, &options)?;
        Ok(Self::new(
            providers,
            PriceTable::from(&config.pricing),
            DispatchPolicy::from(&config.dispatch),
        ))
    }

    /// Providers in the order they are tried.
    pub fn providers(&self) -> &[ProviderEntry] {
        &self.providers
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|e| e.provider.name()).collect()
    }

    /// Whether at least one provider has credentials.
    pub fn has_configured_provider(&self) -> bool {
        self.providers.iter().any(|e| e.provider.is_configured())
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Providers with no entry in the price table.
    pub fn unpriced_providers(&self) -> Vec<&str> {
        self.providers
            .iter()
            .map(|e| e.provider.name())
            .filter(|name| self.prices.rates(name).is_none())
            .collect()
    }

    /// Produce one response for `request`, falling back through providers.
    ///
    /// The caller must have rejected blank messages already.
    pub async fn generate(&self, request: &DispatchRequest) -> DispatchResult {
        let system_prompt = build_system_prompt(request.context.as_ref());
        let turns = assemble_turns(&request.history, &request.message);
        let mut attempts: Vec<AttemptRecord> = Vec::new();

        debug!(
            providers = self.providers.len(),
            turns = turns.len(),
            "dispatching request"
        );

        for (index, entry) in self.providers.iter().enumerate() {
            let provider = &entry.provider;
            let name = provider.name().to_string();

            if !provider.is_configured() {
                debug!(provider = %name, "skipping unconfigured provider");
                attempts.push(AttemptRecord {
                    provider: name,
                    outcome: AttemptOutcome::Skipped,
                });
                continue;
            }

            let outcome = match tokio::time::timeout(
                self.policy.timeout,
                provider.invoke(&system_prompt, &turns),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.policy.timeout)),
            };

            match outcome {
                Ok(completion) => {
                    let cost_estimate =
                        self.prices
                            .cost(&name, completion.input_tokens, completion.output_tokens);
                    info!(
                        provider = %name,
                        model = %completion.model,
                        input_tokens = completion.input_tokens,
                        output_tokens = completion.output_tokens,
                        cost = cost_estimate,
                        "provider succeeded"
                    );
                    return DispatchResult::Success {
                        text: completion.text,
                        provider: name,
                        model: completion.model,
                        usage: Usage {
                            input_tokens: completion.input_tokens,
                            output_tokens: completion.output_tokens,
                            cost_estimate,
                        },
                    };
                }
                Err(e) if e.is_configuration_absent() => {
                    debug!(provider = %name, "provider reported missing configuration");
                    attempts.push(AttemptRecord {
                        provider: name,
                        outcome: AttemptOutcome::Skipped,
                    });
                }
                Err(e) => {
                    warn!(provider = %name, error = %e, "provider failed");
                    attempts.push(AttemptRecord {
                        provider: name,
                        outcome: AttemptOutcome::Failed(e.to_string()),
                    });
                    if self.configured_after(index) {
                        debug!(backoff = ?self.policy.backoff, "backing off before next provider");
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
            }
        }

        let error_summary = summarize(&attempts);
        warn!(summary = %error_summary, "all providers exhausted");
        DispatchResult::Failure {
            error_summary,
            attempts,
        }
    }

    /// Whether any configured provider comes after position `index`.
    fn configured_after(&self, index: usize) -> bool {
        self.providers[index + 1..]
            .iter()
            .any(|e| e.provider.is_configured())
    }
}

/// Aggregate diagnostic for an exhausted call.
fn summarize(attempts: &[AttemptRecord]) -> String {
    let failures: Vec<String> = attempts
        .iter()
        .filter_map(|a| match &a.outcome {
            AttemptOutcome::Failed(msg) => Some(format!("{}: {}", a.provider, msg)),
            AttemptOutcome::Skipped => None,
        })
        .collect();

    if !failures.is_empty() {
        return format!("All AI providers failed. {}", failures.join("; "));
    }
    if attempts.is_empty() {
        return "No AI providers are registered".to_string();
    }
    let checked: Vec<&str> = attempts.iter().map(|a| a.provider.as_str()).collect();
    format!(
        "No AI provider is configured (checked: {})",
        checked.join(", ")
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
