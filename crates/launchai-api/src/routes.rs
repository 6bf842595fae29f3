use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use launchai_core::conversation::ConversationStore;
use launchai_dispatch::Dispatcher;

use crate::handlers::{
    chat::{chat, method_not_allowed},
    health::health_check,
    insights::get_insight,
    providers::list_providers,
};
use crate::middleware::{cors_layer, trace_layer};

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// `None` when persistence is disabled.
    pub store: Option<Arc<ConversationStore>>,
    /// Turns loaded from the store when a request carries only a conversation id.
    pub max_history_turns: usize,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            store: None,
            max_history_turns: 20,
        }
    }

    pub fn with_store(mut self, store: Arc<ConversationStore>, max_history_turns: usize) -> Self {
        self.store = Some(store);
        self.max_history_turns = max_history_turns;
        self
    }
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat).fallback(method_not_allowed))
        .route("/api/providers", get(list_providers))
        .route("/api/insights", get(get_insight))
        .layer(cors_layer())
        .layer(trace_layer())
        .with_state(state)
}
