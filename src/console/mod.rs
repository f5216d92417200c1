//! Operator console state
//!
//! The [`Console`] owns everything the HTTP layer renders: the latest
//! snapshot mirror, the operator's view state (search/filter/sort, page,
//! selection, focus), per-node metric history and the in-flight command
//! map. All derived data (filtered ids, page slices, workflow projections)
//! is recomputed from the mirror on read; only identity-keyed operator
//! state survives a snapshot replacement.

pub mod dispatch;
pub mod engine;
pub mod history;
pub mod pagination;
pub mod reconcile;
pub mod selection;
pub mod workflow;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Node, Resource, ResourceKind, Snapshot};
use crate::utils::{format_bytes, format_uptime};

pub use dispatch::{CommandDispatcher, CommandKey, DispatchError, ResourceAction};
pub use engine::{SortDirection, SortKey, TypeFilter, ViewQuery};
pub use history::{HistoryStore, NodeHistory};
pub use pagination::{PageInfo, PageSize};
pub use reconcile::ReconcileOutcome;
pub use selection::{SelectedResource, SelectionTracker};
pub use workflow::{MaintenanceBanner, NodeAction, NodeProjection, UpdateProjection};

/// Notifications kept before the oldest is dropped
const NOTIFICATION_CAP: usize = 50;

/// An operation was refused by the console before reaching the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("resource {0} not found in the current snapshot")]
    ResourceNotFound(u32),
    #[error("node '{0}' not found in the current snapshot")]
    NodeNotFound(String),
    #[error("{0}")]
    ActionNotAllowed(String),
    #[error(transparent)]
    AlreadyPending(#[from] DispatchError),
}

/// Operator-adjustable view parameters.
///
/// Survives every snapshot replacement untouched; only an explicit
/// operation (or a cluster switch) changes it. Every change that can
/// invalidate the current page resets the persisted page to 1.
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub query: ViewQuery,
    pub page: u32,
    pub page_size: PageSize,
    pub selection: SelectionTracker,
    pub focused_id: Option<u32>,
    /// One-shot jump target, consumed by the next reconciliation
    #[serde(skip)]
    pub highlight_request: Option<u32>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            query: ViewQuery::default(),
            page: 1,
            page_size: PageSize::default(),
            selection: SelectionTracker::new(),
            focused_id: None,
            highlight_request: None,
        }
    }
}

impl ViewState {
    pub fn set_search(&mut self, search: String) {
        if self.query.search != search {
            self.query.search = search;
            self.page = 1;
        }
    }

    pub fn set_filter(&mut self, filter: TypeFilter) {
        if self.query.filter != filter {
            self.query.filter = filter;
            self.page = 1;
        }
    }

    /// Clicking the active sort column flips direction; a new column sorts
    /// ascending.
    pub fn set_sort(&mut self, key: SortKey) {
        if self.query.sort_key == key {
            self.query.sort_direction = self.query.sort_direction.toggled();
        } else {
            self.query.sort_key = key;
            self.query.sort_direction = SortDirection::Asc;
        }
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        if self.page_size != page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    /// Arm a jump to `id`: the reveal must work from anywhere, so search
    /// and type filter are cleared first. Sort order is kept so the page
    /// computation matches what the operator will see.
    fn request_highlight(&mut self, id: u32) {
        self.query.search.clear();
        self.query.filter = TypeFilter::All;
        self.page = 1;
        self.highlight_request = Some(id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Non-blocking operator notification, newest last
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// One rendered table row
#[derive(Debug, Clone, Serialize)]
pub struct ResourceRow {
    #[serde(flatten)]
    pub resource: Resource,
    pub display_name: String,
    pub mem_percent: Option<f64>,
    /// "2.0 GB" style label, absent when the gauge was not reported
    pub mem_display: Option<String>,
    pub selected: bool,
    pub focused: bool,
    pub pending_actions: Vec<ResourceAction>,
}

/// Everything needed to render the resource table
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub cluster_id: String,
    pub query: ViewQuery,
    pub page_info: PageInfo,
    pub page_numbers: Vec<u32>,
    pub rows: Vec<ResourceRow>,
    pub focused: Option<Resource>,
    pub selected_count: usize,
    pub node_count: usize,
    pub last_snapshot_at: Option<DateTime<Utc>>,
}

/// One rendered node card
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    #[serde(flatten)]
    pub node: Node,
    pub projection: NodeProjection,
    /// Evacuation progress in percent while a maintenance task exists
    pub maintenance_progress: Option<f64>,
    /// "3d 7h" style label
    pub uptime: Option<String>,
    pub pending_actions: Vec<NodeAction>,
    pub history: Option<NodeHistory>,
}

/// Result of matching the captured selection against the live mirror
#[derive(Debug, Clone, Serialize)]
pub struct SelectionPartition {
    /// Still present, safe to act on
    pub present: Vec<SelectedResource>,
    /// Vanished since selection; reported per item, never silently skipped
    pub missing: Vec<SelectedResource>,
}

/// The console state for one active cluster
#[derive(Debug)]
pub struct Console {
    cluster_id: String,
    snapshot: Snapshot,
    view: ViewState,
    /// Rendered copy of the focused resource, replaced on field changes
    focused: Option<Resource>,
    history: HistoryStore,
    dispatcher: CommandDispatcher,
    notifications: Vec<Notification>,
    last_applied: Option<DateTime<Utc>>,
}

impl Console {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        let cluster_id = cluster_id.into();
        Self {
            snapshot: Snapshot::empty(cluster_id.clone()),
            cluster_id,
            view: ViewState::default(),
            focused: None,
            history: HistoryStore::new(),
            dispatcher: CommandDispatcher::new(),
            notifications: Vec::new(),
            last_applied: None,
        }
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Replace the mirror with a fresh snapshot and re-bind operator state
    /// against it. Snapshots for another cluster are dropped; they are late
    /// responses from before a cluster switch.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot, now: DateTime<Utc>) -> ReconcileOutcome {
        if snapshot.cluster_id != self.cluster_id {
            warn!(
                got = %snapshot.cluster_id,
                active = %self.cluster_id,
                "dropping snapshot for inactive cluster"
            );
            return ReconcileOutcome::default();
        }

        self.snapshot = snapshot;
        self.last_applied = Some(now);
        self.history.observe(&self.snapshot, now);

        let outcome = reconcile::reconcile(&mut self.view, &mut self.focused, &self.snapshot);
        if outcome != ReconcileOutcome::default() {
            debug!(?outcome, "reconciled view after snapshot");
        }
        outcome
    }

    /// Drop all per-cluster state and start over against an empty mirror.
    /// In-flight commands are kept; they settle on their own.
    pub fn switch_cluster(&mut self, cluster_id: impl Into<String>) {
        self.cluster_id = cluster_id.into();
        self.snapshot = Snapshot::empty(self.cluster_id.clone());
        self.view = ViewState::default();
        self.focused = None;
        self.history.clear();
        self.last_applied = None;
    }

    /// No snapshot has been applied within `stale_after`
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        match self.last_applied {
            Some(at) => now - at > stale_after,
            None => true,
        }
    }

    // --- view parameter operations -------------------------------------

    pub fn set_search(&mut self, search: String) {
        self.view.set_search(search);
    }

    pub fn set_filter(&mut self, filter: TypeFilter) {
        self.view.set_filter(filter);
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.view.set_sort(key);
    }

    pub fn set_page(&mut self, page: u32) {
        self.view.set_page(page);
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.view.set_page_size(page_size);
    }

    // --- selection ------------------------------------------------------

    pub fn toggle_selection(&mut self, id: u32) -> Result<(), ConsoleError> {
        let resource = self
            .snapshot
            .resource(id)
            .ok_or(ConsoleError::ResourceNotFound(id))?;
        self.view.selection.toggle(resource);
        Ok(())
    }

    /// Select every resource matching the current query, not just the page
    pub fn select_all_filtered(&mut self) {
        let ids = engine::filtered_ids(&self.snapshot.resources, &self.view.query);
        let matched: Vec<&Resource> = ids
            .iter()
            .filter_map(|id| self.snapshot.resource(*id))
            .collect();
        self.view.selection.select_all(matched);
    }

    pub fn clear_selection(&mut self) {
        self.view.selection.clear();
    }

    /// Split the captured selection into still-present and vanished items
    pub fn partition_selection(&self) -> SelectionPartition {
        let (present, missing): (Vec<_>, Vec<_>) = self
            .view
            .selection
            .items()
            .iter()
            .cloned()
            .partition(|s| self.snapshot.resource(s.id).is_some());
        SelectionPartition { present, missing }
    }

    // --- focus and highlight ---------------------------------------------

    pub fn focus(&mut self, id: u32) -> Result<Resource, ConsoleError> {
        let resource = self
            .snapshot
            .resource(id)
            .cloned()
            .ok_or(ConsoleError::ResourceNotFound(id))?;
        self.view.focused_id = Some(id);
        self.focused = Some(resource.clone());
        Ok(resource)
    }

    pub fn blur(&mut self) {
        self.view.focused_id = None;
        self.focused = None;
    }

    /// Jump the table to the page containing `id`, clearing search and
    /// filter so the target is guaranteed visible. Returns the page landed
    /// on.
    pub fn reveal(&mut self, id: u32) -> Result<u32, ConsoleError> {
        if self.snapshot.resource(id).is_none() {
            return Err(ConsoleError::ResourceNotFound(id));
        }
        self.view.request_highlight(id);
        let outcome = reconcile::reconcile(&mut self.view, &mut self.focused, &self.snapshot);
        Ok(outcome.jumped_to_page.unwrap_or(1))
    }

    // --- command dispatch -------------------------------------------------

    /// Claim the in-flight slot for a guest command. The caller contacts
    /// the backend only after this succeeds.
    pub fn dispatch_resource(
        &mut self,
        id: u32,
        action: ResourceAction,
        now: DateTime<Utc>,
    ) -> Result<CommandKey, ConsoleError> {
        let resource = self
            .snapshot
            .resource(id)
            .ok_or(ConsoleError::ResourceNotFound(id))?;
        if action == ResourceAction::ForceReset && resource.kind != ResourceKind::Vm {
            return Err(ConsoleError::ActionNotAllowed(format!(
                "force_reset is not available for {}",
                resource.display_name()
            )));
        }
        let key = CommandKey::Resource { id, action };
        self.dispatcher.begin(key.clone(), now)?;
        Ok(key)
    }

    /// Claim the in-flight slot for a node command. The action must be in
    /// the node's currently enabled set, so a reboot on a node still
    /// evacuating is rejected here without a backend round trip.
    pub fn dispatch_node(
        &mut self,
        name: &str,
        action: NodeAction,
        now: DateTime<Utc>,
    ) -> Result<CommandKey, ConsoleError> {
        let node = self
            .snapshot
            .node(name)
            .ok_or_else(|| ConsoleError::NodeNotFound(name.to_string()))?;
        let projection = workflow::project(node);
        if !projection.enabled_actions.contains(&action) {
            return Err(ConsoleError::ActionNotAllowed(format!(
                "{} is not available on node '{}' in its current state",
                action.as_str(),
                name
            )));
        }
        let key = CommandKey::Node {
            name: name.to_string(),
            action,
        };
        self.dispatcher.begin(key.clone(), now)?;
        Ok(key)
    }

    /// Release a command slot once the backend answered. Failures surface
    /// as a notification; the mirror itself only changes when a later
    /// snapshot confirms the effect.
    pub fn settle(&mut self, key: &CommandKey, result: Result<(), String>, now: DateTime<Utc>) {
        self.dispatcher.settle(key);
        if let Err(reason) = result {
            let target = match key {
                CommandKey::Resource { id, action } => {
                    format!("{} on resource {}", action.as_str(), id)
                }
                CommandKey::Node { name, action } => {
                    format!("{} on node '{}'", action.as_str(), name)
                }
            };
            self.notify(
                NotificationLevel::Error,
                format!("{} failed: {}", target, reason),
                now,
            );
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: String, at: DateTime<Utc>) {
        if self.notifications.len() >= NOTIFICATION_CAP {
            self.notifications.remove(0);
        }
        self.notifications.push(Notification { level, message, at });
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    // --- rendering ----------------------------------------------------------

    /// Assemble the resource table for the current view parameters
    pub fn page_view(&self) -> PageView {
        let filtered = engine::filtered_ids(&self.snapshot.resources, &self.view.query);
        let (page_ids, page_info) = pagination::paginate(&filtered, self.view.page, self.view.page_size);
        let page_numbers = pagination::page_numbers(page_info.effective_page, page_info.total_pages);

        let rows = page_ids
            .iter()
            .filter_map(|id| self.snapshot.resource(*id))
            .map(|resource| ResourceRow {
                display_name: resource.display_name(),
                mem_percent: resource.mem_percent(),
                mem_display: resource.mem_used.map(format_bytes),
                selected: self.view.selection.contains(resource.id),
                focused: self.view.focused_id == Some(resource.id),
                pending_actions: self.dispatcher.pending_resource_actions(resource.id),
                resource: resource.clone(),
            })
            .collect();

        PageView {
            cluster_id: self.cluster_id.clone(),
            query: self.view.query.clone(),
            page_info,
            page_numbers,
            rows,
            focused: self.focused.clone(),
            selected_count: self.view.selection.len(),
            node_count: self.snapshot.nodes.len(),
            last_snapshot_at: self.last_applied,
        }
    }

    /// Assemble the node cards with workflow projections and sparkline
    /// history
    pub fn node_views(&self) -> Vec<NodeView> {
        self.snapshot
            .nodes
            .iter()
            .map(|node| NodeView {
                projection: workflow::project(node),
                maintenance_progress: node
                    .maintenance
                    .as_ref()
                    .map(|task| task.progress_percent()),
                uptime: node.uptime_secs.map(format_uptime),
                pending_actions: self.dispatcher.pending_node_actions(&node.name),
                history: self.history.get(&node.name).cloned(),
                node: node.clone(),
            })
            .collect()
    }
}
