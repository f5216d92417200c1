//! Command dispatch bookkeeping
//!
//! One keyed map of in-flight commands, owned here rather than scattered
//! across per-view loading flags, so a pending start button is disabled in
//! the card, the table row and the detail panel at the same time. At most
//! one command may be in flight per (target, action) pair; a second attempt
//! is rejected locally without touching the backend. There is no optimistic
//! state to roll back on failure: the mirror only changes when a later
//! snapshot confirms the effect.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::workflow::NodeAction;

/// Lifecycle actions on a single guest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAction {
    Start,
    Shutdown,
    Reboot,
    /// Hard reset, VMs only
    ForceReset,
    ForceStop,
    Migrate,
    Clone,
    Delete,
}

impl ResourceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceAction::Start => "start",
            ResourceAction::Shutdown => "shutdown",
            ResourceAction::Reboot => "reboot",
            ResourceAction::ForceReset => "force_reset",
            ResourceAction::ForceStop => "force_stop",
            ResourceAction::Migrate => "migrate",
            ResourceAction::Clone => "clone",
            ResourceAction::Delete => "delete",
        }
    }
}

/// Identity of one dispatched command
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum CommandKey {
    Resource { id: u32, action: ResourceAction },
    Node { name: String, action: NodeAction },
}

/// A command was refused before reaching the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("command already in flight for this target and action")]
    AlreadyPending,
}

/// Tracks which (target, action) pairs currently have a command in flight
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    pending: HashMap<CommandKey, DateTime<Utc>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the in-flight slot for a command. Fails if the same pair is
    /// already pending; the caller must not contact the backend in that
    /// case.
    pub fn begin(&mut self, key: CommandKey, now: DateTime<Utc>) -> Result<(), DispatchError> {
        if self.pending.contains_key(&key) {
            return Err(DispatchError::AlreadyPending);
        }
        self.pending.insert(key, now);
        Ok(())
    }

    /// Release the slot once the command settled, successfully or not. The
    /// control becomes re-actionable either way.
    pub fn settle(&mut self, key: &CommandKey) {
        self.pending.remove(key);
    }

    pub fn is_pending(&self, key: &CommandKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Actions currently in flight for one guest, for spinner rendering
    pub fn pending_resource_actions(&self, id: u32) -> Vec<ResourceAction> {
        self.pending
            .keys()
            .filter_map(|key| match key {
                CommandKey::Resource { id: rid, action } if *rid == id => Some(*action),
                _ => None,
            })
            .collect()
    }

    /// Actions currently in flight for one node
    pub fn pending_node_actions(&self, name: &str) -> Vec<NodeAction> {
        self.pending
            .keys()
            .filter_map(|key| match key {
                CommandKey::Node { name: n, action } if n == name => Some(*action),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
