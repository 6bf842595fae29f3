//! Provider error type.

use std::time::Duration;

use launchai_core::utils::truncate_string;
use serde::Deserialize;

/// Longest upstream error body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Why a provider call failed.
///
/// Everything except [`ProviderError::NotConfigured`] is treated as a
/// transient upstream failure by the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider is not configured (missing API key)")]
    NotConfigured,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Configuration problems are deployment issues, not service health issues.
    pub fn is_configuration_absent(&self) -> bool {
        matches!(self, ProviderError::NotConfigured)
    }

    /// Build a `Status` error from a non-2xx response body.
    ///
    /// Uses the `error.message` field when the body is a JSON error envelope
    /// (both Anthropic and OpenAI use that shape), otherwise the raw body.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        #[derive(Deserialize)]
        struct Envelope {
            error: EnvelopeError,
        }
        #[derive(Deserialize)]
        struct EnvelopeError {
            message: String,
        }

        let message = serde_json::from_str::<Envelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.trim().to_string());

        ProviderError::Status {
            status: status.as_u16(),
            message: truncate_string(&message, MAX_ERROR_BODY_CHARS),
        }
    }
}

/// Read a response, turning non-2xx statuses into [`ProviderError::Status`].
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(ProviderError::from_status(status, &body))
}
