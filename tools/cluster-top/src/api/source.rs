//! The driven port every data backend implements.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use super::types::MetricValue;
use crate::domain::{BaselineRow, ClusterMember, ClusterState, NodeId};

/// Attribute values grouped by consistent id, then by attribute name.
pub type AttributeMap = HashMap<String, HashMap<String, String>>;

/// Errors that can occur when talking to the cluster.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON-RPC error: {0}")]
    Rpc(String),
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the cluster's membership, registry and metrics.
///
/// # Coordinator detection
///
/// Nothing here exposes the coordinator directly. Callers treat the live
/// member with the lowest join order as the coordinator. That holds for the
/// default ring-based membership protocol but is NOT guaranteed under
/// alternative (e.g. externally coordinated) membership protocols, where the
/// oldest member need not be the one making cluster-wide decisions. The
/// heuristic is kept as is; correct detection depends on protocol semantics
/// this crate does not model.
#[async_trait]
pub trait ClusterMetadataSource: Send + Sync {
    /// All members currently in the topology, servers and clients alike.
    async fn list_live_members(&self) -> Result<Vec<ClusterMember>, SourceError>;

    /// The persisted baseline registry as the cluster itself reports it.
    async fn list_baseline_registry(&self) -> Result<Vec<BaselineRow>, SourceError>;

    /// Persisted attributes for many consistent ids in one round trip.
    ///
    /// Ids without stored attributes are simply absent from the result.
    async fn lookup_attributes(
        &self,
        ids: &[String],
        attr_names: &[&str],
    ) -> Result<AttributeMap, SourceError>;

    /// Single scalar metric of one member. `None` when the member does not
    /// expose the metric.
    async fn read_metric(
        &self,
        name: &str,
        node_id: NodeId,
    ) -> Result<Option<MetricValue>, SourceError>;

    async fn cluster_state(&self) -> Result<ClusterState, SourceError>;

    /// Whether data redistribution after the last membership change finished.
    async fn rebalanced_flag(&self) -> Result<bool, SourceError>;
}
