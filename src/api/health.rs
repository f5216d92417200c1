//! Health check endpoints

use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub cluster_id: String,
    pub stale: bool,
}

/// GET /health/ready
///
/// Ready once at least one snapshot has been applied recently. Returns 503
/// while the view is stale so load balancers stop routing to a console
/// showing outdated data.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let console = state.console.read().await;
    let stale_after = Duration::seconds(state.config.feed.stale_after_secs as i64);
    let stale = console.is_stale(Utc::now(), stale_after);

    let status = if stale {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status,
        Json(ReadinessResponse {
            status: if stale { "stale" } else { "ready" },
            cluster_id: console.cluster_id().to_string(),
            stale,
        }),
    )
}
