use axum::{extract::State, Json};

use crate::response::ProviderStatus;
use crate::routes::AppState;

/// Providers in the order the dispatcher tries them.
pub async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderStatus>> {
    let rows = state
        .dispatcher
        .providers()
        .iter()
        .map(|entry| ProviderStatus {
            name: entry.provider.name().to_string(),
            configured: entry.provider.is_configured(),
            priority: entry.priority,
        })
        .collect();
    Json(rows)
}
