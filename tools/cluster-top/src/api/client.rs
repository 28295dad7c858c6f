//! JSON-RPC client for the cluster metadata endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::source::{AttributeMap, ClusterMetadataSource, SourceError};
use super::types::*;
use crate::domain::{BaselineRow, ClusterMember, ClusterState, NodeId};

/// Metadata source backed by a JSON-RPC endpoint of the cluster.
pub struct JsonRpcMetadataSource {
    client: Client,
    endpoint: String,
    request_id: AtomicU64,
}

impl JsonRpcMetadataSource {
    /// Create a new client for `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(2)))
            .build()
            .map_err(SourceError::Http)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            request_id: AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call a JSON-RPC method whose result must be present.
    async fn call<P: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, SourceError> {
        self.call_optional(method, params)
            .await?
            .ok_or_else(|| SourceError::Parse(format!("Missing result in {} response", method)))
    }

    /// Call a JSON-RPC method. A `null` result is legal (metric reads).
    async fn call_optional<P: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<Option<R>, SourceError> {
        let request = JsonRpcRequest::new(method, params, self.next_id());
        debug!(method, id = request.id, "calling cluster endpoint");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    SourceError::Connection(format!("Cannot connect to {}", self.endpoint))
                } else {
                    SourceError::Http(e)
                }
            })?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        match rpc_response.error {
            Some(error) => Err(SourceError::Rpc(error.to_string())),
            None => Ok(rpc_response.result),
        }
    }
}

#[async_trait]
impl ClusterMetadataSource for JsonRpcMetadataSource {
    async fn list_live_members(&self) -> Result<Vec<ClusterMember>, SourceError> {
        self.call::<[(); 0], Vec<ClusterMember>>("cluster_liveMembers", [])
            .await
    }

    async fn list_baseline_registry(&self) -> Result<Vec<BaselineRow>, SourceError> {
        self.call::<[(); 0], Vec<BaselineRow>>("cluster_baselineNodes", [])
            .await
    }

    async fn lookup_attributes(
        &self,
        ids: &[String],
        attr_names: &[&str],
    ) -> Result<AttributeMap, SourceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = AttributeQuery {
            consistent_ids: ids,
            attributes: attr_names,
        };
        let rows: Vec<AttributeRow> = self
            .call("cluster_baselineAttributes", [query])
            .await?;

        Ok(group_attributes(rows, ids, attr_names))
    }

    async fn read_metric(
        &self,
        name: &str,
        node_id: NodeId,
    ) -> Result<Option<MetricValue>, SourceError> {
        self.call_optional("cluster_metric", [MetricQuery { name, node_id }])
            .await
    }

    async fn cluster_state(&self) -> Result<ClusterState, SourceError> {
        self.call::<[(); 0], ClusterState>("cluster_state", []).await
    }

    async fn rebalanced_flag(&self) -> Result<bool, SourceError> {
        self.call::<[(); 0], bool>("cluster_rebalanced", []).await
    }
}

/// Group attribute rows by consistent id, dropping anything that was not
/// asked for. The endpoint may return the whole registry.
fn group_attributes(rows: Vec<AttributeRow>, ids: &[String], attr_names: &[&str]) -> AttributeMap {
    let mut grouped = AttributeMap::new();

    for row in rows {
        if !ids.contains(&row.consistent_id) || !attr_names.contains(&row.name.as_str()) {
            continue;
        }

        grouped
            .entry(row.consistent_id)
            .or_default()
            .insert(row.name, row.value);
    }

    grouped
}
