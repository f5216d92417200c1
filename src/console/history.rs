//! Node metric history for sparklines
//!
//! Keeps a fixed-length ring of recent samples per node: cpu/mem/disk
//! percent straight from the snapshot, plus network in/out rates derived
//! from the cumulative byte counters between consecutive snapshots. The
//! history is console-owned state keyed by node name: it survives snapshot
//! replacement and is dropped when its node vanishes from the inventory.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Node, Snapshot};

/// Samples kept per series; at a 2s refresh tick this is ~40s of history
pub const HISTORY_LEN: usize = 20;

const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Fixed-length ring of samples, zero-filled until real data arrives
#[derive(Debug, Clone, Serialize)]
pub struct SampleRing {
    samples: Vec<f64>,
}

impl Default for SampleRing {
    fn default() -> Self {
        Self {
            samples: vec![0.0; HISTORY_LEN],
        }
    }
}

impl SampleRing {
    fn push(&mut self, value: f64) {
        self.samples.remove(0);
        self.samples.push(value);
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn latest(&self) -> f64 {
        *self.samples.last().unwrap_or(&0.0)
    }
}

/// Per-node sparkline series
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeHistory {
    pub cpu: SampleRing,
    pub mem: SampleRing,
    pub disk: SampleRing,
    /// MiB/s
    pub net_in: SampleRing,
    /// MiB/s
    pub net_out: SampleRing,
    #[serde(skip)]
    last_counters: Option<NetCounters>,
}

#[derive(Debug, Clone, Copy)]
struct NetCounters {
    net_in: u64,
    net_out: u64,
    at: DateTime<Utc>,
}

impl NodeHistory {
    fn record(&mut self, node: &Node, at: DateTime<Utc>) {
        self.cpu.push(node.cpu_percent.unwrap_or(0.0));
        self.mem.push(node.mem_percent.unwrap_or(0.0));
        self.disk.push(node.disk_percent.unwrap_or(0.0));

        let (in_rate, out_rate) = self.net_rates(node, at);
        self.net_in.push(in_rate);
        self.net_out.push(out_rate);

        if let (Some(net_in), Some(net_out)) = (node.net_in, node.net_out) {
            self.last_counters = Some(NetCounters {
                net_in,
                net_out,
                at,
            });
        }
    }

    /// Rate between the previous and current counters, clamped at zero so a
    /// counter reset (node reboot) shows as a dip instead of a huge
    /// negative spike.
    fn net_rates(&self, node: &Node, at: DateTime<Utc>) -> (f64, f64) {
        let (Some(net_in), Some(net_out)) = (node.net_in, node.net_out) else {
            return (0.0, 0.0);
        };
        let Some(prev) = self.last_counters else {
            return (0.0, 0.0);
        };
        let elapsed = (at - prev.at).num_milliseconds() as f64 / 1000.0;
        if elapsed <= 0.0 {
            return (0.0, 0.0);
        }
        let in_rate = (net_in.saturating_sub(prev.net_in)) as f64 / elapsed / BYTES_PER_MIB;
        let out_rate = (net_out.saturating_sub(prev.net_out)) as f64 / elapsed / BYTES_PER_MIB;
        (in_rate, out_rate)
    }
}

/// All node histories for the active cluster
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    nodes: HashMap<String, NodeHistory>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one snapshot into the history, dropping nodes that vanished
    pub fn observe(&mut self, snapshot: &Snapshot, at: DateTime<Utc>) {
        self.nodes
            .retain(|name, _| snapshot.nodes.iter().any(|n| &n.name == name));

        for node in &snapshot.nodes {
            self.nodes
                .entry(node.name.clone())
                .or_default()
                .record(node, at);
        }
    }

    pub fn get(&self, name: &str) -> Option<&NodeHistory> {
        self.nodes.get(name)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
