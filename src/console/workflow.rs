//! Workflow state projection
//!
//! Maps the raw maintenance/update task payloads embedded in a node to an
//! explicit banner state, the set of node actions the operator may take, and
//! the update task's display state. The projection is pure: it reads one
//! node and produces one value, so every view (card, compact row, detail)
//! derives the same answer from the same snapshot.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{
    MaintenanceStatus, MaintenanceTask, Node, UpdateStatus, UpdateTask,
};

/// Maintenance banner shown on a node card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceBanner {
    None,
    Starting,
    Evacuating,
    Completed,
    CompletedWithErrorsUnacked,
    CompletedWithErrorsAcked,
    Failed,
    /// Payload state the console does not recognize; surfaced as-is rather
    /// than guessed at
    Unknown,
}

/// Operator actions available on a node
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NodeAction {
    EnterMaintenance,
    ExitMaintenance,
    AcknowledgeErrors,
    StartUpdate,
    DismissUpdate,
    Reboot,
    Shutdown,
    RemoveFromCluster,
    MoveToCluster,
}

impl NodeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeAction::EnterMaintenance => "enter_maintenance",
            NodeAction::ExitMaintenance => "exit_maintenance",
            NodeAction::AcknowledgeErrors => "acknowledge_errors",
            NodeAction::StartUpdate => "start_update",
            NodeAction::DismissUpdate => "dismiss_update",
            NodeAction::Reboot => "reboot",
            NodeAction::Shutdown => "shutdown",
            NodeAction::RemoveFromCluster => "remove_from_cluster",
            NodeAction::MoveToCluster => "move_to_cluster",
        }
    }
}

/// Display state of a node's update task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProjection {
    pub status: UpdateStatus,
    /// Phase label while running ("apt upgrade", "waiting for node", ...)
    pub phase_label: Option<String>,
    /// Terminal update banners stay until the operator dismisses them
    pub dismissible: bool,
    pub packages_upgraded: u32,
    pub error: Option<String>,
}

/// Everything the renderer needs to draw a node's workflow state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProjection {
    pub banner: MaintenanceBanner,
    pub enabled_actions: BTreeSet<NodeAction>,
    pub update: Option<UpdateProjection>,
}

/// Whether the disruptive action set (reboot/shutdown/update/remove/move)
/// is unlocked: evacuation finished cleanly, or finished with errors that
/// the operator has explicitly acknowledged.
pub fn maintenance_unlocked(task: &MaintenanceTask) -> bool {
    match task.status {
        MaintenanceStatus::Completed => true,
        MaintenanceStatus::CompletedWithErrors => task.acknowledged,
        _ => false,
    }
}

fn banner_for(task: &MaintenanceTask) -> MaintenanceBanner {
    match task.status {
        MaintenanceStatus::Starting => MaintenanceBanner::Starting,
        MaintenanceStatus::Evacuating => MaintenanceBanner::Evacuating,
        MaintenanceStatus::Completed => MaintenanceBanner::Completed,
        MaintenanceStatus::CompletedWithErrors => {
            if task.acknowledged {
                MaintenanceBanner::CompletedWithErrorsAcked
            } else {
                MaintenanceBanner::CompletedWithErrorsUnacked
            }
        }
        MaintenanceStatus::Failed => MaintenanceBanner::Failed,
        MaintenanceStatus::Unknown => MaintenanceBanner::Unknown,
    }
}

fn project_update(task: &UpdateTask) -> UpdateProjection {
    UpdateProjection {
        status: task.status,
        phase_label: task.phase.as_ref().map(|p| p.label().to_string()),
        dismissible: matches!(task.status, UpdateStatus::Completed | UpdateStatus::Failed),
        packages_upgraded: task.packages_upgraded,
        error: task.error.clone(),
    }
}

const UNLOCKED_ACTIONS: [NodeAction; 6] = [
    NodeAction::ExitMaintenance,
    NodeAction::StartUpdate,
    NodeAction::Reboot,
    NodeAction::Shutdown,
    NodeAction::RemoveFromCluster,
    NodeAction::MoveToCluster,
];

fn enabled_actions(node: &Node) -> BTreeSet<NodeAction> {
    // An active or terminal-but-undismissed update owns the node: while it
    // runs nothing is allowed, afterwards the operator can dismiss the
    // banner or leave maintenance.
    if let Some(update) = &node.update {
        return match update.status {
            UpdateStatus::Running | UpdateStatus::Unknown => BTreeSet::new(),
            UpdateStatus::Completed | UpdateStatus::Failed => {
                [NodeAction::DismissUpdate, NodeAction::ExitMaintenance]
                    .into_iter()
                    .collect()
            }
        };
    }

    match &node.maintenance {
        None => [NodeAction::EnterMaintenance].into_iter().collect(),
        Some(task) => {
            if maintenance_unlocked(task) {
                UNLOCKED_ACTIONS.into_iter().collect()
            } else if task.status == MaintenanceStatus::CompletedWithErrors {
                [NodeAction::AcknowledgeErrors, NodeAction::ExitMaintenance]
                    .into_iter()
                    .collect()
            } else {
                // starting / evacuating / failed / unknown: exiting
                // maintenance is the only move
                [NodeAction::ExitMaintenance].into_iter().collect()
            }
        }
    }
}

/// Project a node's raw task payloads into its workflow display state
pub fn project(node: &Node) -> NodeProjection {
    NodeProjection {
        banner: node
            .maintenance
            .as_ref()
            .map(banner_for)
            .unwrap_or(MaintenanceBanner::None),
        enabled_actions: enabled_actions(node),
        update: node.update.as_ref().map(project_update),
    }
}
