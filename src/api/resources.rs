//! Resource command endpoints
//!
//! Guest lifecycle commands follow the same shape everywhere: claim the
//! in-flight slot in the console, call the backend without holding the
//! lock, then settle the slot with the outcome. The mirror itself is never
//! updated optimistically; the next snapshot confirms the effect.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::console::{ResourceAction, SelectedResource};
use crate::utils::error::{AppError, AppResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bulk/migrate", post(bulk_migrate))
        .route("/{id}/{action}", post(resource_action))
}

/// POST /api/v1/resources/{id}/{action}
///
/// Optional JSON body carries action parameters (migration target, clone
/// name).
async fn resource_action(
    State(state): State<AppState>,
    Path((id, action)): Path<(u32, ResourceAction)>,
    body: Option<Json<serde_json::Value>>,
) -> AppResult<StatusCode> {
    let params = body.map(|Json(v)| v).unwrap_or(serde_json::Value::Null);
    let now = Utc::now();

    let (key, cluster_id) = {
        let mut console = state.console.write().await;
        let key = console.dispatch_resource(id, action, now)?;
        (key, console.cluster_id().to_string())
    };
    info!(id, action = action.as_str(), "dispatching resource command");

    let result = state
        .cluster
        .resource_command(&cluster_id, id, action, params)
        .await;

    let outcome = result.as_ref().map(|_| ()).map_err(|e| e.to_string());
    state.console.write().await.settle(&key, outcome, Utc::now());

    result.map_err(|e| AppError::Backend(e.to_string()))?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Deserialize)]
struct BulkMigrateBody {
    /// Node the selected guests migrate to
    target: String,
}

#[derive(Debug, Serialize)]
struct BulkItemResult {
    id: u32,
    name: Option<String>,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BulkItemResult {
    fn ok(item: &SelectedResource) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            ok: true,
            error: None,
        }
    }

    fn failed(item: &SelectedResource, error: String) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            ok: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
struct BulkReport {
    requested: usize,
    succeeded: usize,
    failed: usize,
    items: Vec<BulkItemResult>,
}

/// POST /api/v1/resources/bulk/migrate
///
/// Acts on the captured selection. Guests that vanished since selection
/// are reported as per-item failures instead of being silently skipped;
/// one failing guest never aborts the rest.
async fn bulk_migrate(
    State(state): State<AppState>,
    Json(body): Json<BulkMigrateBody>,
) -> AppResult<Json<BulkReport>> {
    let (partition, cluster_id) = {
        let console = state.console.read().await;
        (console.partition_selection(), console.cluster_id().to_string())
    };
    let requested = partition.present.len() + partition.missing.len();
    info!(requested, target = %body.target, "bulk migration requested");

    let mut items: Vec<BulkItemResult> = partition
        .missing
        .iter()
        .map(|item| BulkItemResult::failed(item, "no longer present in the cluster".to_string()))
        .collect();

    for item in &partition.present {
        // The captured node is where the guest was at selection time; a
        // guest already on the target needs no migration.
        if item.node == body.target {
            items.push(BulkItemResult::ok(item));
            continue;
        }

        let key = match state.console.write().await.dispatch_resource(
            item.id,
            ResourceAction::Migrate,
            Utc::now(),
        ) {
            Ok(key) => key,
            // Already pending or re-checked against the live mirror; either
            // way the item fails without aborting the batch.
            Err(err) => {
                items.push(BulkItemResult::failed(item, err.to_string()));
                continue;
            }
        };

        let result = state
            .cluster
            .resource_command(
                &cluster_id,
                item.id,
                ResourceAction::Migrate,
                json!({ "target": body.target }),
            )
            .await;

        let outcome = result.as_ref().map(|_| ()).map_err(|e| e.to_string());
        state.console.write().await.settle(&key, outcome, Utc::now());

        match result {
            Ok(()) => items.push(BulkItemResult::ok(item)),
            Err(err) => items.push(BulkItemResult::failed(item, err.to_string())),
        }
    }

    let succeeded = items.iter().filter(|i| i.ok).count();
    Ok(Json(BulkReport {
        requested,
        succeeded,
        failed: requested - succeeded,
        items,
    }))
}
