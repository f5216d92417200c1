//! Snapshot payload
//!
//! A snapshot is the full inventory of the active cluster at one refresh
//! tick. The console never merges snapshots: each one replaces the local
//! mirror wholesale, so a stale-but-consistent view is possible but a torn
//! merge of two ticks is not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Node, Resource};

/// Full-replacement inventory view delivered per refresh tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Cluster this snapshot describes
    pub cluster_id: String,

    /// All guests in the cluster, in backend order
    #[serde(default)]
    pub resources: Vec<Resource>,

    /// All nodes with embedded maintenance/update task payloads
    #[serde(default)]
    pub nodes: Vec<Node>,

    /// When the backend assembled this snapshot
    #[serde(default)]
    pub taken_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Empty snapshot for a cluster, used before the first tick arrives
    pub fn empty(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            resources: Vec::new(),
            nodes: Vec::new(),
            taken_at: None,
        }
    }

    /// Look up a resource by its identity key
    pub fn resource(&self, id: u32) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Look up a node by name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }
}
