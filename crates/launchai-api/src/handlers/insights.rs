use axum::{extract::Query, Json};
use serde::Deserialize;

use launchai_core::insights::{self, Insight};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightQuery {
    pub product_type: Option<String>,
    pub audience: Option<String>,
}

/// Launch insight for a product type and audience, or the generic one.
pub async fn get_insight(Query(query): Query<InsightQuery>) -> Json<Insight> {
    Json(insights::for_profile(
        query.product_type.as_deref(),
        query.audience.as_deref(),
    ))
}
