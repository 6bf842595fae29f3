//! `POST /api/chat`: validate, dispatch, map the result to a status code.

use axum::{body::Bytes, extract::State, Json};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use launchai_core::conversation::ConversationStore;
use launchai_core::insights;
use launchai_core::types::{BusinessContext, DispatchRequest, DispatchResult, Turn};

use crate::error::{ApiError, ApiResult};
use crate::response::{ChatResponse, UsageBody};
use crate::routes::AppState;

/// A validated chat request body.
///
/// `message` is checked first so a missing or non-string message always gets
/// its own 400; the other fields are decoded one by one and a bad value is
/// reported against the field that carried it.
#[derive(Debug)]
pub struct ChatRequest {
    pub message: String,
    pub user_data: Option<BusinessContext>,
    pub conversation_history: Option<Vec<Turn>>,
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    fn parse(body: &[u8]) -> ApiResult<Self> {
        let raw: Value = serde_json::from_slice(body).map_err(|e| {
            debug!(error = %e, "unparseable chat body");
            ApiError::message_required()
        })?;
        let Value::Object(mut fields) = raw else {
            return Err(ApiError::message_required());
        };

        let message = match fields.remove("message") {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            _ => return Err(ApiError::message_required()),
        };

        Ok(ChatRequest {
            message,
            user_data: take_field(&mut fields, "userData")?,
            conversation_history: take_field(&mut fields, "conversationHistory")?,
            conversation_id: take_field(&mut fields, "conversationId")?,
        })
    }

    fn conversation_id(&self) -> Option<&str> {
        self.conversation_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Decode an optional body field; `null` counts as absent.
fn take_field<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str) -> ApiResult<Option<T>> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ApiError::Validation(format!("Invalid {key}: {e}"))),
    }
}

pub async fn chat(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<ChatResponse>> {
    let request = ChatRequest::parse(&body)?;
    let message = request.message.as_str();

    let supplied_id = request.conversation_id().map(str::to_string);
    let history = match (&request.conversation_history, &supplied_id, &state.store) {
        (Some(history), _, _) => history.clone(),
        (None, Some(id), Some(store)) => {
            load_history(store.clone(), id.clone(), state.max_history_turns).await
        }
        _ => Vec::new(),
    };

    let mut dispatch = DispatchRequest::new(message).with_history(history);
    if let Some(context) = request.user_data.clone().filter(|c| !c.is_empty()) {
        dispatch = dispatch.with_context(context);
    }
    let matched_insight = dispatch.context.as_ref().and_then(insights::for_context).copied();

    // A stored conversation always gets an id so the client can continue it.
    let conversation_id = match (&state.store, supplied_id) {
        (_, Some(id)) => Some(id),
        (Some(_), None) => Some(ConversationStore::new_conversation_id()),
        (None, None) => None,
    };

    info!(
        conversation_id = conversation_id.as_deref().unwrap_or("-"),
        history = dispatch.history.len(),
        has_context = dispatch.context.is_some(),
        "chat request"
    );

    let result = state.dispatcher.generate(&dispatch).await;

    if let (Some(store), Some(id)) = (&state.store, &conversation_id) {
        persist(store.clone(), id.clone(), message.to_string(), result.clone());
    }

    match result {
        DispatchResult::Success {
            text,
            provider,
            model,
            usage,
        } => Ok(Json(ChatResponse {
            success: true,
            response: text,
            provider,
            model,
            usage: UsageBody::from(&usage),
            conversation_id,
            insights: matched_insight,
        })),
        DispatchResult::Failure { error_summary, .. } => {
            Err(ApiError::ProvidersExhausted(error_summary))
        }
    }
}

/// Any method other than POST on `/api/chat`.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn load_history(store: Arc<ConversationStore>, id: String, max_turns: usize) -> Vec<Turn> {
    match tokio::task::spawn_blocking(move || store.history(&id, max_turns)).await {
        Ok(turns) => turns,
        Err(e) => {
            warn!(error = %e, "history load task failed");
            Vec::new()
        }
    }
}

/// Fire-and-forget; the store only records successes and logs its own errors.
fn persist(store: Arc<ConversationStore>, id: String, user_text: String, result: DispatchResult) {
    if !result.is_success() {
        return;
    }
    tokio::task::spawn_blocking(move || {
        store.record_exchange(&id, &user_text, &result);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_text(err: ApiError) -> String {
        match err {
            ApiError::Validation(text) => text,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_full_body() {
        let body = br#"{
            "message": "Help me launch",
            "userData": {"businessType": "SaaS", "goals": "leads"},
            "conversationHistory": [{"role": "user", "content": "Hi"}],
            "conversationId": " abc "
        }"#;
        let req = ChatRequest::parse(body).unwrap();
        assert_eq!(req.message, "Help me launch");
        assert_eq!(req.user_data.unwrap().goals.as_deref(), Some("leads"));
        assert_eq!(req.conversation_history.unwrap(), vec![Turn::user("Hi")]);
        assert_eq!(req.conversation_id.as_deref(), Some(" abc "));
    }

    #[test]
    fn test_message_must_be_non_blank_string() {
        for body in [
            r#"{}"#,
            r#"[]"#,
            r#"{"message": null}"#,
            r#"{"message": 42}"#,
            r#"{"message": ["hi"]}"#,
            r#"{"message": "   "}"#,
            r#"{"message": 42, "userData": "bad"}"#,
        ] {
            let err = ChatRequest::parse(body.as_bytes()).unwrap_err();
            assert_eq!(
                validation_text(err),
                "Message is required and must be a string",
                "body {body}"
            );
        }
    }

    #[test]
    fn test_malformed_json_is_validation_error() {
        let err = ChatRequest::parse(b"{not json").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_non_string_profile_values_are_accepted() {
        let req = ChatRequest::parse(br#"{"message":"x","userData":{"budget":500}}"#).unwrap();
        assert_eq!(req.user_data.unwrap().budget.as_deref(), Some("500"));
    }

    #[test]
    fn test_bad_fields_are_named_in_the_error() {
        let err = ChatRequest::parse(br#"{"message":"x","userData":"SaaS"}"#).unwrap_err();
        assert!(validation_text(err).starts_with("Invalid userData:"));

        let err = ChatRequest::parse(
            br#"{"message":"x","conversationHistory":[{"role":"tool","content":"y"}]}"#,
        )
        .unwrap_err();
        assert!(validation_text(err).starts_with("Invalid conversationHistory:"));

        let err = ChatRequest::parse(br#"{"message":"x","conversationId":7}"#).unwrap_err();
        assert!(validation_text(err).starts_with("Invalid conversationId:"));
    }

    #[test]
    fn test_null_fields_are_absent() {
        let req = ChatRequest::parse(
            br#"{"message":"x","userData":null,"conversationHistory":null,"conversationId":null}"#,
        )
        .unwrap();
        assert!(req.user_data.is_none());
        assert!(req.conversation_history.is_none());
        assert!(req.conversation_id().is_none());
    }

    #[test]
    fn test_blank_conversation_id_ignored() {
        let req = ChatRequest::parse(br#"{"message":"x","conversationId":"  "}"#).unwrap();
        assert!(req.conversation_id().is_none());
    }
}
