//! Bulk-selection tracking
//!
//! The selection captures identity plus the display fields a bulk action
//! needs (node, kind, name) at selection time. Bulk operations act on that
//! point-in-time set: if a selected guest has moved or vanished by the time
//! the action runs, the execution path reports it per item instead of the
//! selection being silently pruned behind the operator's back.

use serde::{Deserialize, Serialize};

use crate::models::{Resource, ResourceKind};

/// A selected guest with its display fields frozen at selection time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedResource {
    pub id: u32,
    pub node: String,
    pub kind: ResourceKind,
    pub name: Option<String>,
}

impl From<&Resource> for SelectedResource {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id,
            node: resource.node.clone(),
            kind: resource.kind,
            name: resource.name.clone(),
        }
    }
}

/// Identity-stable selection set, ordered by selection time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionTracker {
    items: Vec<SelectedResource>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the resource if absent, remove it if present
    pub fn toggle(&mut self, resource: &Resource) {
        if let Some(pos) = self.items.iter().position(|s| s.id == resource.id) {
            self.items.remove(pos);
        } else {
            self.items.push(SelectedResource::from(resource));
        }
    }

    /// Replace the selection with the whole filtered set. "Select all"
    /// means all matches, not just the visible page.
    pub fn select_all<'a>(&mut self, filtered: impl IntoIterator<Item = &'a Resource>) {
        self.items = filtered.into_iter().map(SelectedResource::from).collect();
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, id: u32) -> bool {
        self.items.iter().any(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[SelectedResource] {
        &self.items
    }

    pub fn ids(&self) -> Vec<u32> {
        self.items.iter().map(|s| s.id).collect()
    }
}
