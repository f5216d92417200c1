//! API routes and handlers
//!
//! This module defines all API endpoints and their routing.

use axum::{routing::get, Router};

use crate::AppState;

mod events;
mod health;
mod nodes;
mod resources;
mod view;

/// All application routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", api_v1())
}

fn api_v1() -> Router<AppState> {
    Router::new()
        .nest("/view", view::routes())
        .nest("/resources", resources::routes())
        .nest("/nodes", nodes::routes())
        .route("/notifications", get(view::notifications))
        .route("/events", get(events::subscribe))
}
