//! Resource (VM / container) data model

use serde::{Deserialize, Serialize};

/// Kind of a managed guest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Vm,
    Container,
}

impl ResourceKind {
    /// Short display label ("VM" / "CT")
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Vm => "VM",
            ResourceKind::Container => "CT",
        }
    }
}

/// Runtime status of a resource as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Running,
    Stopped,
    /// Any status the backend reports that is neither running nor stopped
    /// (e.g. "paused", "suspended"). Kept verbatim for display.
    #[serde(untagged)]
    Other(String),
}

impl ResourceStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, ResourceStatus::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, ResourceStatus::Stopped)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ResourceStatus::Running => "running",
            ResourceStatus::Stopped => "stopped",
            ResourceStatus::Other(s) => s,
        }
    }
}

/// A virtual machine or container instance.
///
/// `id` is the only identity key across snapshots; every other field may
/// change between refresh ticks (a migration moves `node`, a rename changes
/// `name`, and so on).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Cluster-unique guest id
    pub id: u32,

    pub kind: ResourceKind,

    /// Display name, not guaranteed to be set
    #[serde(default)]
    pub name: Option<String>,

    /// Name of the node currently hosting the guest
    pub node: String,

    pub status: ResourceStatus,

    /// Unordered labels attached by operators
    #[serde(default)]
    pub tags: Vec<String>,

    /// Memory in use, bytes. `None` means the gauge was not reported,
    /// which is distinct from zero.
    #[serde(default)]
    pub mem_used: Option<u64>,

    #[serde(default)]
    pub mem_total: Option<u64>,

    #[serde(default)]
    pub cpu_percent: Option<f64>,

    #[serde(default)]
    pub cpu_cores: Option<u32>,
}

impl Resource {
    /// Display name, falling back to "VM 101" / "CT 204" style
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{} {}", self.kind.label(), self.id),
        }
    }

    /// Memory usage percent, if both gauges were reported
    pub fn mem_percent(&self) -> Option<f64> {
        match (self.mem_used, self.mem_total) {
            (Some(used), Some(total)) if total > 0 => Some(used as f64 / total as f64 * 100.0),
            _ => None,
        }
    }
}
