//! Cluster backend client
//!
//! Talks to the cluster management backend over HTTP: fetches full
//! inventory snapshots and forwards guest/node commands. Handlers and the
//! snapshot feed depend on the [`ClusterApi`] trait so tests can swap in a
//! stub backend.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::BackendConfig;
use crate::console::{NodeAction, ResourceAction};
use crate::models::Snapshot;

/// Operations the console needs from the cluster backend
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Fetch the full inventory snapshot for one cluster
    async fn fetch_snapshot(&self, cluster_id: &str) -> Result<Snapshot>;

    /// Run a lifecycle action on a guest. `params` carries action-specific
    /// fields (migration target, clone name) and may be null.
    async fn resource_command(
        &self,
        cluster_id: &str,
        id: u32,
        action: ResourceAction,
        params: serde_json::Value,
    ) -> Result<()>;

    /// Run a workflow action on a node
    async fn node_command(&self, cluster_id: &str, node: &str, action: NodeAction) -> Result<()>;
}

/// HTTP client for the cluster management backend
#[derive(Clone)]
pub struct HttpClusterClient {
    client: Client,
    base_url: String,
}

impl HttpClusterClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        info!("Initializing cluster backend client for {}", config.url);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .use_rustls_tls()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    async fn handle_json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("backend returned {}: {}", status, body);
        }
        response
            .json()
            .await
            .context("Failed to parse backend response")
    }

    async fn handle_empty(&self, response: Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("backend returned {}: {}", status, body);
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterApi for HttpClusterClient {
    async fn fetch_snapshot(&self, cluster_id: &str) -> Result<Snapshot> {
        let url = format!("{}/api/clusters/{}/snapshot", self.base_url, cluster_id);
        debug!(%url, "fetching snapshot");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch snapshot")?;
        self.handle_json(response).await
    }

    async fn resource_command(
        &self,
        cluster_id: &str,
        id: u32,
        action: ResourceAction,
        params: serde_json::Value,
    ) -> Result<()> {
        let url = format!(
            "{}/api/clusters/{}/resources/{}/{}",
            self.base_url,
            cluster_id,
            id,
            action.as_str()
        );
        debug!(%url, "sending resource command");

        let response = self
            .client
            .post(&url)
            .json(&params)
            .send()
            .await
            .with_context(|| format!("Failed to send {} command", action.as_str()))?;
        self.handle_empty(response).await
    }

    async fn node_command(&self, cluster_id: &str, node: &str, action: NodeAction) -> Result<()> {
        let url = format!(
            "{}/api/clusters/{}/nodes/{}/{}",
            self.base_url,
            cluster_id,
            node,
            action.as_str()
        );
        debug!(%url, "sending node command");

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send {} command", action.as_str()))?;
        self.handle_empty(response).await
    }
}
