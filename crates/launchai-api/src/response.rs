use serde::Serialize;

use launchai_core::insights::Insight;
use launchai_core::types::Usage;

/// Successful `POST /api/chat` body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub provider: String,
    pub model: String,
    pub usage: UsageBody,
    #[serde(rename = "conversationId", skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Curated insight when the profile matches one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<Insight>,
}

/// Usage as clients see it: snake_case token counts and `cost`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UsageBody {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
}

impl From<&Usage> for UsageBody {
    fn from(usage: &Usage) -> Self {
        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cost: usage.cost_estimate,
        }
    }
}

/// One row of `GET /api/providers`.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub configured: bool,
    pub priority: u32,
}
