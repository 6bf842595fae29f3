//! Core types for LaunchAI — conversation turns, business context, and the
//! normalized request/result shapes that flow through the dispatcher.
//!
//! Provider-specific wire formats never appear here; each provider client
//! translates [`Turn`]s into its own request body.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────
// Turns
// ─────────────────────────────────────────────

/// Author of a conversation turn.
///
/// `System` is accepted when deserializing caller-supplied history but is
/// stripped before dispatch; system content is owned by the dispatcher.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a conversation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Turn {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a system turn. Only useful for representing raw inbound history.
    pub fn system(content: impl Into<String>) -> Self {
        Turn {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

// ─────────────────────────────────────────────
// Business context (user profile data)
// ─────────────────────────────────────────────

/// Free-form business attributes supplied with a chat request.
///
/// Every field is optional; empty or whitespace-only values count as absent.
/// Numbers and booleans are accepted and kept as their JSON text, so a
/// profile like `{"budget": 500}` reads as `"500"`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessContext {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub business_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_audience: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub goals: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub budget: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub industry: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_challenges: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeline: Option<String>,
}

/// Scalar → string; arrays of scalars are joined with ", ". Objects and
/// nulls are treated as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => {
            let parts: Vec<String> = items.iter().filter_map(scalar).collect();
            Some(parts.join(", ")).filter(|s| !s.is_empty())
        }
        Some(other) => scalar(&other),
        None => None,
    })
}

impl BusinessContext {
    /// Populated fields as `(label, value)` pairs, in display order.
    pub fn populated_fields(&self) -> Vec<(&'static str, &str)> {
        let all: [(&'static str, &Option<String>); 7] = [
            ("Business Type", &self.business_type),
            ("Target Audience", &self.target_audience),
            ("Goals", &self.goals),
            ("Budget", &self.budget),
            ("Industry", &self.industry),
            ("Current Challenges", &self.current_challenges),
            ("Timeline", &self.timeline),
        ];

        all.into_iter()
            .filter_map(|(label, value)| {
                value
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| (label, v))
            })
            .collect()
    }

    /// Whether no field carries a usable value.
    pub fn is_empty(&self) -> bool {
        self.populated_fields().is_empty()
    }
}

// ─────────────────────────────────────────────
// Dispatch request / provider completion
// ─────────────────────────────────────────────

/// A normalized request for one AI-generated response.
#[derive(Clone, Debug, Default)]
pub struct DispatchRequest {
    /// The new user message. Callers validate it is non-blank.
    pub message: String,
    pub context: Option<BusinessContext>,
    /// Prior turns in caller order. May contain system turns (filtered later).
    pub history: Vec<Turn>,
}

impl DispatchRequest {
    pub fn new(message: impl Into<String>) -> Self {
        DispatchRequest {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: BusinessContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }
}

/// Normalized output of one successful provider call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Model the upstream reports having used.
    pub model: String,
}

// ─────────────────────────────────────────────
// Dispatch result
// ─────────────────────────────────────────────

/// Token counts and the derived cost estimate for one completion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_estimate: f64,
}

/// What happened when the dispatcher reached a provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Provider had no credentials; skipped without backoff.
    Skipped,
    /// Provider was invoked and failed with this message.
    Failed(String),
}

/// One provider visit during a dispatch call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptRecord {
    pub provider: String,
    pub outcome: AttemptOutcome,
}

/// Typed outcome of `Dispatcher::generate`. Never an `Err`.
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchResult {
    Success {
        text: String,
        provider: String,
        model: String,
        usage: Usage,
    },
    Failure {
        /// Every failed provider with its last error, in attempt order.
        error_summary: String,
        attempts: Vec<AttemptRecord>,
    },
}

impl DispatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchResult::Success { .. })
    }

    /// Response text on success.
    pub fn text(&self) -> Option<&str> {
        match self {
            DispatchResult::Success { text, .. } => Some(text),
            DispatchResult::Failure { .. } => None,
        }
    }

    /// Name of the provider that produced the response.
    pub fn provider(&self) -> Option<&str> {
        match self {
            DispatchResult::Success { provider, .. } => Some(provider),
            DispatchResult::Failure { .. } => None,
        }
    }

    pub fn usage(&self) -> Option<&Usage> {
        match self {
            DispatchResult::Success { usage, .. } => Some(usage),
            DispatchResult::Failure { .. } => None,
        }
    }

    pub fn error_summary(&self) -> Option<&str> {
        match self {
            DispatchResult::Success { .. } => None,
            DispatchResult::Failure { error_summary, .. } => Some(error_summary),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
