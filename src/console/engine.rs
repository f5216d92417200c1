//! View-state engine
//!
//! Derives the ordered, filtered subset of the latest snapshot from the
//! current search/filter/sort parameters. This is a pure function of its
//! inputs: it is recomputed from scratch whenever the snapshot or the query
//! changes and carries no state of its own, so there are no ordering
//! dependencies between refresh ticks and operator edits.

use serde::{Deserialize, Serialize};

use crate::models::{Resource, ResourceKind};

/// Type filter applied to the resource list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    All,
    Running,
    Stopped,
    Vm,
    Container,
}

impl Default for TypeFilter {
    fn default() -> Self {
        TypeFilter::All
    }
}

impl TypeFilter {
    fn matches(&self, resource: &Resource) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Running => resource.status.is_running(),
            TypeFilter::Stopped => resource.status.is_stopped(),
            TypeFilter::Vm => resource.kind == ResourceKind::Vm,
            TypeFilter::Container => resource.kind == ResourceKind::Container,
        }
    }
}

/// Column the list is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Id,
    Name,
    Kind,
    Node,
    Memory,
    Cpu,
    Status,
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::Id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Asc
    }
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Search/filter/sort parameters, the engine's only input besides the
/// snapshot itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub filter: TypeFilter,
    #[serde(default)]
    pub sort_key: SortKey,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

/// Sort value extracted from a resource; numeric keys compare numerically,
/// everything else compares as the stringified value.
enum SortValue {
    Num(f64),
    Str(String),
}

fn sort_value(resource: &Resource, key: SortKey) -> SortValue {
    match key {
        SortKey::Id => SortValue::Num(resource.id as f64),
        // Missing gauges sort before everything, so unknown stays grouped
        // at one end instead of interleaving with real values.
        SortKey::Memory => SortValue::Num(
            resource
                .mem_used
                .map(|b| b as f64)
                .unwrap_or(f64::NEG_INFINITY),
        ),
        SortKey::Cpu => SortValue::Num(resource.cpu_percent.unwrap_or(f64::NEG_INFINITY)),
        SortKey::Name => SortValue::Str(resource.name.clone().unwrap_or_default()),
        SortKey::Kind => SortValue::Str(resource.kind.label().to_string()),
        SortKey::Node => SortValue::Str(resource.node.clone()),
        SortKey::Status => SortValue::Str(resource.status.as_str().to_string()),
    }
}

fn matches_search(resource: &Resource, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let needle = needle.to_lowercase();

    if let Some(name) = &resource.name {
        if name.to_lowercase().contains(&needle) {
            return true;
        }
    }
    if resource.id.to_string().contains(&needle) {
        return true;
    }
    if resource.node.to_lowercase().contains(&needle) {
        return true;
    }
    resource
        .tags
        .iter()
        .any(|tag| tag.to_lowercase().contains(&needle))
}

/// Compute the ordered ids of all resources matching the query.
///
/// Ties under the sort key are left in snapshot order (stable sort), so
/// equal rows do not jitter between refresh ticks. The returned ids are
/// always a subset of the input snapshot.
pub fn filtered_ids(resources: &[Resource], query: &ViewQuery) -> Vec<u32> {
    let mut matched: Vec<&Resource> = resources
        .iter()
        .filter(|r| matches_search(r, &query.search) && query.filter.matches(r))
        .collect();

    matched.sort_by(|a, b| {
        let ord = match (sort_value(a, query.sort_key), sort_value(b, query.sort_key)) {
            (SortValue::Num(x), SortValue::Num(y)) => x.total_cmp(&y),
            (x, y) => stringify(x).cmp(&stringify(y)),
        };
        match query.sort_direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    matched.iter().map(|r| r.id).collect()
}

fn stringify(value: SortValue) -> String {
    match value {
        SortValue::Num(n) => n.to_string(),
        SortValue::Str(s) => s,
    }
}
