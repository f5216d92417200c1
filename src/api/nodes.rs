//! Node endpoints
//!
//! Node cards with workflow projections and metric history, plus workflow
//! commands. Commands are gated twice: the console rejects actions the
//! node's workflow state does not allow, before the backend is contacted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::console::{NodeAction, NodeView};
use crate::utils::error::{AppError, AppResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_nodes))
        .route("/{name}/{action}", post(node_action))
}

#[derive(Debug, Serialize)]
struct NodeListResponse {
    cluster_id: String,
    node_count: usize,
    nodes: Vec<NodeView>,
}

/// GET /api/v1/nodes
async fn list_nodes(State(state): State<AppState>) -> Json<NodeListResponse> {
    let console = state.console.read().await;
    let nodes = console.node_views();
    Json(NodeListResponse {
        cluster_id: console.cluster_id().to_string(),
        node_count: nodes.len(),
        nodes,
    })
}

/// POST /api/v1/nodes/{name}/{action}
async fn node_action(
    State(state): State<AppState>,
    Path((name, action)): Path<(String, NodeAction)>,
) -> AppResult<StatusCode> {
    let now = Utc::now();

    let (key, cluster_id) = {
        let mut console = state.console.write().await;
        let key = console.dispatch_node(&name, action, now)?;
        (key, console.cluster_id().to_string())
    };
    info!(node = %name, action = action.as_str(), "dispatching node command");

    let result = state.cluster.node_command(&cluster_id, &name, action).await;

    let outcome = result.as_ref().map(|_| ()).map_err(|e| e.to_string());
    state.console.write().await.settle(&key, outcome, Utc::now());

    result.map_err(|e| AppError::Backend(e.to_string()))?;
    Ok(StatusCode::ACCEPTED)
}
