//! Test application setup utilities
//!
//! Sets up a test instance of the application with a stub cluster backend
//! so handlers can be exercised with real HTTP requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tower::ServiceExt;

use clusterdeck::console::{Console, NodeAction, ResourceAction};
use clusterdeck::models::{
    Node, NodeStatus, Resource, ResourceKind, ResourceStatus, Snapshot,
};
use clusterdeck::services::ClusterApi;
use clusterdeck::{api, AppConfig, AppState};

/// Stub cluster backend recording every command it receives
pub struct StubCluster {
    pub snapshot: Mutex<Snapshot>,
    /// When set, the next command fails with "backend rejected command"
    pub fail_next_command: AtomicBool,
    pub commands: Mutex<Vec<String>>,
}

impl StubCluster {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            fail_next_command: AtomicBool::new(false),
            commands: Mutex::new(Vec::new()),
        }
    }

    async fn record(&self, command: String) -> anyhow::Result<()> {
        self.commands.lock().await.push(command);
        if self.fail_next_command.swap(false, Ordering::SeqCst) {
            anyhow::bail!("backend rejected command");
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterApi for StubCluster {
    async fn fetch_snapshot(&self, _cluster_id: &str) -> anyhow::Result<Snapshot> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn resource_command(
        &self,
        _cluster_id: &str,
        id: u32,
        action: ResourceAction,
        _params: serde_json::Value,
    ) -> anyhow::Result<()> {
        self.record(format!("{}:{}", action.as_str(), id)).await
    }

    async fn node_command(
        &self,
        _cluster_id: &str,
        node: &str,
        action: NodeAction,
    ) -> anyhow::Result<()> {
        self.record(format!("{}:{}", action.as_str(), node)).await
    }
}

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub backend: Arc<StubCluster>,
}

impl TestApp {
    /// Create a test application with the given snapshot already applied
    pub async fn with_snapshot(snapshot: Snapshot) -> Self {
        let mut console = Console::new(snapshot.cluster_id.clone());
        console.apply_snapshot(snapshot.clone(), Utc::now());

        let backend = Arc::new(StubCluster::new(snapshot));
        let (events, _) = broadcast::channel(8);

        let state = AppState {
            config: test_config(),
            console: Arc::new(RwLock::new(console)),
            cluster: backend.clone(),
            events,
        };

        let router = api::routes().with_state(state.clone());

        Self {
            router,
            state,
            backend,
        }
    }

    /// Create a test application with an empty console (no snapshot yet)
    pub async fn empty(cluster_id: &str) -> Self {
        let backend = Arc::new(StubCluster::new(Snapshot::empty(cluster_id)));
        let (events, _) = broadcast::channel(8);

        let state = AppState {
            config: test_config(),
            console: Arc::new(RwLock::new(Console::new(cluster_id))),
            cluster: backend.clone(),
            events,
        };

        let router = api::routes().with_state(state.clone());

        Self {
            router,
            state,
            backend,
        }
    }

    /// Replace the mirror as if a feed tick delivered this snapshot
    pub async fn apply_snapshot(&self, snapshot: Snapshot) {
        self.state
            .console
            .write()
            .await
            .apply_snapshot(snapshot, Utc::now());
    }

    /// Make a GET request to the test application
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a POST request without a body
    pub async fn post(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a PUT request with JSON body
    pub async fn put_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.request(
            Request::builder()
                .method("PUT")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub body: bytes::Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    pub fn assert_status(&self, expected: axum::http::StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    pub fn assert_ok(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::OK)
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.backend.default_cluster = "test".to_string();
    config
}

// ---- fixtures ----------------------------------------------------------

/// A running VM with sensible defaults
pub fn vm(id: u32, name: &str, node: &str) -> Resource {
    Resource {
        id,
        kind: ResourceKind::Vm,
        name: Some(name.to_string()),
        node: node.to_string(),
        status: ResourceStatus::Running,
        tags: vec![],
        mem_used: Some(2 * 1024 * 1024 * 1024),
        mem_total: Some(8 * 1024 * 1024 * 1024),
        cpu_percent: Some(5.0),
        cpu_cores: Some(4),
    }
}

/// An online node with no task payloads
pub fn online_node(name: &str) -> Node {
    Node {
        name: name.to_string(),
        status: NodeStatus::Online,
        cpu_percent: Some(10.0),
        mem_percent: Some(40.0),
        disk_percent: Some(20.0),
        mem_used: None,
        mem_total: None,
        disk_used: None,
        disk_total: None,
        net_in: Some(0),
        net_out: Some(0),
        uptime_secs: Some(86_400),
        load_avg: None,
        kernel_version: None,
        platform_version: None,
        last_seen: None,
        maintenance: None,
        update: None,
    }
}

/// Cluster snapshot with `n` sequentially numbered VMs on one node
pub fn snapshot_with_vms(cluster_id: &str, n: u32) -> Snapshot {
    Snapshot {
        cluster_id: cluster_id.to_string(),
        resources: (1..=n)
            .map(|id| vm(id, &format!("vm{:03}", id), "pve1"))
            .collect(),
        nodes: vec![online_node("pve1"), online_node("pve2")],
        taken_at: Some(Utc::now()),
    }
}
