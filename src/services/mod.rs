//! Background services and backend clients

pub mod cluster;
pub mod feed;

pub use cluster::{ClusterApi, HttpClusterClient};
pub use feed::{FeedEvent, SnapshotFeed};
