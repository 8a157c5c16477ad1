use axum::{Json, Router, http::StatusCode};
use chrono::Utc;
use serde::Serialize;

/// Body of the liveness probe.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
}

pub async fn health_check() -> (StatusCode, Json<HealthStatus>) {
    (
        StatusCode::OK,
        Json(HealthStatus {
            status: "ok",
            timestamp: Utc::now().to_rfc3339(),
        }),
    )
}

pub fn health_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", axum::routing::get(health_check))
}
