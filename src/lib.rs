//! Clusterdeck Library
//!
//! Server-side operator console for a virtualization cluster: mirrors
//! backend inventory snapshots and exposes the operator's live view over
//! HTTP.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

pub mod api;
pub mod config;
pub mod console;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
use console::Console;
use services::{ClusterApi, FeedEvent};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Console state for the active cluster
    pub console: Arc<RwLock<Console>>,
    /// Cluster backend client
    pub cluster: Arc<dyn ClusterApi>,
    /// Live event channel fed by the snapshot feed
    pub events: broadcast::Sender<FeedEvent>,
}
