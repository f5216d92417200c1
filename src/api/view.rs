//! View state endpoints
//!
//! Everything the operator does to their view of the resource table:
//! search, filter, sort, paging, selection, focus and the reveal jump.
//! Each mutation answers with the freshly assembled page so the client
//! renders exactly what the server now holds.

use axum::{
    extract::State,
    routing::{delete, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::console::{Notification, PageSize, PageView, SortKey, TypeFilter};
use crate::utils::error::AppResult;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(get_view))
        .route("/search", put(set_search))
        .route("/filter", put(set_filter))
        .route("/sort", put(set_sort))
        .route("/page", put(set_page))
        .route("/page-size", put(set_page_size))
        .route("/selection/toggle", post(toggle_selection))
        .route("/selection/all", post(select_all))
        .route("/selection", delete(clear_selection))
        .route("/focus", put(set_focus).delete(clear_focus))
        .route("/reveal", post(reveal))
        .route("/cluster", put(switch_cluster))
}

/// GET /api/v1/view
async fn get_view(State(state): State<AppState>) -> Json<PageView> {
    Json(state.console.read().await.page_view())
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    search: String,
}

/// PUT /api/v1/view/search
async fn set_search(
    State(state): State<AppState>,
    Json(body): Json<SearchBody>,
) -> Json<PageView> {
    let mut console = state.console.write().await;
    console.set_search(body.search);
    Json(console.page_view())
}

#[derive(Debug, Deserialize)]
struct FilterBody {
    filter: TypeFilter,
}

/// PUT /api/v1/view/filter
async fn set_filter(
    State(state): State<AppState>,
    Json(body): Json<FilterBody>,
) -> Json<PageView> {
    let mut console = state.console.write().await;
    console.set_filter(body.filter);
    Json(console.page_view())
}

#[derive(Debug, Deserialize)]
struct SortBody {
    key: SortKey,
}

/// PUT /api/v1/view/sort
///
/// Repeating the current sort key flips the direction.
async fn set_sort(State(state): State<AppState>, Json(body): Json<SortBody>) -> Json<PageView> {
    let mut console = state.console.write().await;
    console.set_sort(body.key);
    Json(console.page_view())
}

#[derive(Debug, Deserialize)]
struct PageBody {
    page: u32,
}

/// PUT /api/v1/view/page
async fn set_page(State(state): State<AppState>, Json(body): Json<PageBody>) -> Json<PageView> {
    let mut console = state.console.write().await;
    console.set_page(body.page);
    Json(console.page_view())
}

#[derive(Debug, Deserialize)]
struct PageSizeBody {
    page_size: PageSize,
}

/// PUT /api/v1/view/page-size
async fn set_page_size(
    State(state): State<AppState>,
    Json(body): Json<PageSizeBody>,
) -> Json<PageView> {
    let mut console = state.console.write().await;
    console.set_page_size(body.page_size);
    Json(console.page_view())
}

#[derive(Debug, Deserialize)]
struct IdBody {
    id: u32,
}

/// POST /api/v1/view/selection/toggle
async fn toggle_selection(
    State(state): State<AppState>,
    Json(body): Json<IdBody>,
) -> AppResult<Json<PageView>> {
    let mut console = state.console.write().await;
    console.toggle_selection(body.id)?;
    Ok(Json(console.page_view()))
}

/// POST /api/v1/view/selection/all
async fn select_all(State(state): State<AppState>) -> Json<PageView> {
    let mut console = state.console.write().await;
    console.select_all_filtered();
    Json(console.page_view())
}

/// DELETE /api/v1/view/selection
async fn clear_selection(State(state): State<AppState>) -> Json<PageView> {
    let mut console = state.console.write().await;
    console.clear_selection();
    Json(console.page_view())
}

/// PUT /api/v1/view/focus
async fn set_focus(
    State(state): State<AppState>,
    Json(body): Json<IdBody>,
) -> AppResult<Json<PageView>> {
    let mut console = state.console.write().await;
    console.focus(body.id)?;
    Ok(Json(console.page_view()))
}

/// DELETE /api/v1/view/focus
async fn clear_focus(State(state): State<AppState>) -> Json<PageView> {
    let mut console = state.console.write().await;
    console.blur();
    Json(console.page_view())
}

/// POST /api/v1/view/reveal
///
/// Jump the table to the page containing the given resource, clearing
/// search and filter so it is visible.
async fn reveal(
    State(state): State<AppState>,
    Json(body): Json<IdBody>,
) -> AppResult<Json<PageView>> {
    let mut console = state.console.write().await;
    console.reveal(body.id)?;
    Ok(Json(console.page_view()))
}

/// GET /api/v1/notifications
pub(super) async fn notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.console.read().await.notifications().to_vec())
}

#[derive(Debug, Deserialize)]
struct ClusterBody {
    cluster_id: String,
}

/// PUT /api/v1/view/cluster
///
/// Switch the active cluster. All view state is reset; the next feed poll
/// fills the mirror from the new cluster.
async fn switch_cluster(
    State(state): State<AppState>,
    Json(body): Json<ClusterBody>,
) -> Json<PageView> {
    let mut console = state.console.write().await;
    console.switch_cluster(body.cluster_id);
    Json(console.page_view())
}
