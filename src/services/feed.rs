//! Snapshot feed
//!
//! Background task that polls the cluster backend on a fixed interval and
//! applies each snapshot to the console. A failed poll is logged and
//! skipped; the console keeps serving the last good snapshot and reports
//! staleness through its own timestamps. Subscribers (the SSE endpoint)
//! are told after every applied snapshot so clients can re-render.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, warn};

use crate::console::Console;

use super::cluster::ClusterApi;

/// Broadcast capacity; a lagging SSE client skips ticks rather than
/// blocking the feed
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Event pushed to live subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEvent {
    /// A snapshot was applied to the console
    Snapshot {
        cluster_id: String,
        resource_count: usize,
        node_count: usize,
        applied_at: DateTime<Utc>,
    },
    /// A poll failed; the view may be going stale
    PollFailed { message: String },
}

/// Polls the backend and feeds the console
pub struct SnapshotFeed {
    console: Arc<RwLock<Console>>,
    cluster: Arc<dyn ClusterApi>,
    poll_interval: Duration,
    events: broadcast::Sender<FeedEvent>,
}

impl SnapshotFeed {
    pub fn new(
        console: Arc<RwLock<Console>>,
        cluster: Arc<dyn ClusterApi>,
        poll_interval: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            console,
            cluster,
            poll_interval,
            events,
        }
    }

    /// Sender half for the SSE endpoint to subscribe through
    pub fn events(&self) -> broadcast::Sender<FeedEvent> {
        self.events.clone()
    }

    /// Poll loop; runs until the process exits
    pub async fn run(self) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }

    /// One poll cycle: fetch, apply, notify. The lock is only held for the
    /// synchronous apply, never across the backend call.
    pub async fn poll_once(&self) {
        let cluster_id = self.console.read().await.cluster_id().to_string();

        match self.cluster.fetch_snapshot(&cluster_id).await {
            Ok(snapshot) => {
                let now = Utc::now();
                let resource_count = snapshot.resources.len();
                let node_count = snapshot.nodes.len();

                self.console.write().await.apply_snapshot(snapshot, now);
                debug!(%cluster_id, resource_count, node_count, "applied snapshot");

                // Send fails only when nobody is subscribed.
                let _ = self.events.send(FeedEvent::Snapshot {
                    cluster_id,
                    resource_count,
                    node_count,
                    applied_at: now,
                });
            }
            Err(err) => {
                warn!(%cluster_id, error = %err, "snapshot poll failed, keeping last good snapshot");
                let _ = self.events.send(FeedEvent::PollFailed {
                    message: err.to_string(),
                });
            }
        }
    }
}
