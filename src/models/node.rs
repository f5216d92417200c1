//! Node data model
//!
//! Nodes arrive embedded in each snapshot together with their active
//! maintenance/update task payloads. All gauges are optional: a node that is
//! unreachable reports nothing, and "no data" must stay distinguishable from
//! a legitimate zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reachability of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
}

impl Default for NodeStatus {
    fn default() -> Self {
        NodeStatus::Offline
    }
}

/// A physical cluster member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Node name (identity key)
    pub name: String,

    #[serde(default)]
    pub status: NodeStatus,

    #[serde(default)]
    pub cpu_percent: Option<f64>,

    #[serde(default)]
    pub mem_percent: Option<f64>,

    #[serde(default)]
    pub disk_percent: Option<f64>,

    #[serde(default)]
    pub mem_used: Option<u64>,

    #[serde(default)]
    pub mem_total: Option<u64>,

    #[serde(default)]
    pub disk_used: Option<u64>,

    #[serde(default)]
    pub disk_total: Option<u64>,

    /// Cumulative network byte counters; rates are derived between snapshots
    #[serde(default)]
    pub net_in: Option<u64>,

    #[serde(default)]
    pub net_out: Option<u64>,

    #[serde(default)]
    pub uptime_secs: Option<u64>,

    #[serde(default)]
    pub load_avg: Option<Vec<f64>>,

    #[serde(default)]
    pub kernel_version: Option<String>,

    #[serde(default)]
    pub platform_version: Option<String>,

    /// When the node last answered, for the degraded/offline card
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,

    /// Active maintenance/evacuation task, at most one per node
    #[serde(default)]
    pub maintenance: Option<MaintenanceTask>,

    /// Active software update task, at most one per node
    #[serde(default)]
    pub update: Option<UpdateTask>,
}

impl Node {
    pub fn is_offline(&self) -> bool {
        self.status == NodeStatus::Offline
    }
}

/// Raw maintenance task state as delivered on the wire.
///
/// The backend has historically used both `running` and `evacuating` for the
/// migration phase; the decoder folds the alias into one variant. Anything
/// unrecognized becomes `Unknown` rather than being guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Starting,
    #[serde(alias = "running")]
    Evacuating,
    Completed,
    CompletedWithErrors,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Guest that could not be migrated off a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedVm {
    #[serde(alias = "vmid")]
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
}

/// Node evacuation/maintenance task payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub status: MaintenanceStatus,

    /// Guests migrated so far. Older backends sent `migrated_vms`.
    #[serde(default, alias = "migrated_vms")]
    pub migrated_count: u32,

    #[serde(default)]
    pub total_vms: u32,

    /// Guest currently being migrated, while evacuating
    #[serde(default)]
    pub current_vm: Option<FailedVm>,

    /// Guests that could not be moved (typically local storage)
    #[serde(default)]
    pub failed_vms: Vec<FailedVm>,

    /// Operator acknowledged the failed migrations; only meaningful in
    /// `completed_with_errors`
    #[serde(default)]
    pub acknowledged: bool,

    #[serde(default)]
    pub error: Option<String>,
}

impl MaintenanceTask {
    /// Evacuation progress, 0–100
    pub fn progress_percent(&self) -> f64 {
        if self.total_vms == 0 {
            return 0.0;
        }
        self.migrated_count as f64 / self.total_vms as f64 * 100.0
    }
}

/// Raw update task state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    #[serde(alias = "starting")]
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Phase within a running update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePhase {
    AptUpdate,
    AptUpgrade,
    Reboot,
    WaitOnline,
    Done,
    #[serde(untagged)]
    Other(String),
}

impl UpdatePhase {
    /// Human label shown next to the update banner
    pub fn label(&self) -> &str {
        match self {
            UpdatePhase::AptUpdate => "apt update",
            UpdatePhase::AptUpgrade => "apt upgrade",
            UpdatePhase::Reboot => "reboot",
            UpdatePhase::WaitOnline => "waiting for node",
            UpdatePhase::Done => "done",
            UpdatePhase::Other(s) => s,
        }
    }
}

/// One timestamped line of update command output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

/// Node software update task payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    pub status: UpdateStatus,

    #[serde(default)]
    pub phase: Option<UpdatePhase>,

    /// Append-only log, truncated to the newest lines by the backend
    #[serde(default)]
    pub output_lines: Vec<OutputLine>,

    #[serde(default)]
    pub packages_upgraded: u32,

    #[serde(default)]
    pub error: Option<String>,

    /// Whether the node reboots after the packages are applied
    #[serde(default)]
    pub with_reboot: bool,
}
