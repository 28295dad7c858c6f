//! Point-in-time view of the whole topology.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::classifier::{classify, NodeClassification};
use super::member::{ClusterMember, NodeId, OfflineMember};
use super::metrics;
use crate::api::{ClusterMetadataSource, MetricValue, SourceError};

/// Activation state of the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterState {
    Active,
    ActiveReadOnly,
    #[default]
    Inactive,
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClusterState::Active => "ACTIVE",
            ClusterState::ActiveReadOnly => "ACTIVE_READ_ONLY",
            ClusterState::Inactive => "INACTIVE",
        };
        f.write_str(name)
    }
}

/// Errors that abort a snapshot build.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: SourceError,
    },
    #[error("Metric {name} is missing on node {node_id}")]
    MissingMetric { name: &'static str, node_id: NodeId },
    #[error("Metric {name} on node {node_id} has unexpected value {value:?}")]
    UnexpectedMetric {
        name: &'static str,
        node_id: NodeId,
        value: MetricValue,
    },
    #[error("Cluster has no live members")]
    EmptyTopology,
}

impl SnapshotError {
    pub(crate) fn fetch(what: &'static str) -> impl FnOnce(SourceError) -> Self {
        move |source| SnapshotError::Fetch { what, source }
    }
}

/// Immutable result of one successful build.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologySnapshot {
    online_baseline: Vec<ClusterMember>,
    offline_baseline: Vec<OfflineMember>,
    non_baseline_online: Vec<ClusterMember>,
    clients: Vec<ClusterMember>,
    coordinator: ClusterMember,
    topology_version: i64,
    cluster_state: ClusterState,
    rebalanced: bool,
}

impl TopologySnapshot {
    pub fn online_baseline(&self) -> &[ClusterMember] {
        &self.online_baseline
    }

    pub fn offline_baseline(&self) -> &[OfflineMember] {
        &self.offline_baseline
    }

    /// Server members outside the baseline.
    pub fn non_baseline_online(&self) -> &[ClusterMember] {
        &self.non_baseline_online
    }

    pub fn clients(&self) -> &[ClusterMember] {
        &self.clients
    }

    /// Oldest live member by join order, clients included. See
    /// [`ClusterMetadataSource`] for why this is only a heuristic.
    pub fn coordinator(&self) -> &ClusterMember {
        &self.coordinator
    }

    pub fn topology_version(&self) -> i64 {
        self.topology_version
    }

    pub fn cluster_state(&self) -> ClusterState {
        self.cluster_state
    }

    pub fn rebalanced(&self) -> bool {
        self.rebalanced
    }

    /// All server members currently live, baseline or not.
    pub fn servers(&self) -> impl Iterator<Item = &ClusterMember> {
        self.online_baseline.iter().chain(self.non_baseline_online.iter())
    }
}

/// Builds a [`TopologySnapshot`] from a metadata source.
///
/// A build either succeeds completely or fails; there are no partial
/// snapshots. Only the offline attribute lookup is allowed to degrade.
pub struct TopologySnapshotBuilder {
    source: Arc<dyn ClusterMetadataSource>,
}

impl TopologySnapshotBuilder {
    pub fn new(source: Arc<dyn ClusterMetadataSource>) -> Self {
        Self { source }
    }

    pub async fn build(&self) -> Result<TopologySnapshot, SnapshotError> {
        let source = self.source.as_ref();

        let members = source
            .list_live_members()
            .await
            .map_err(SnapshotError::fetch("live members"))?;
        if members.is_empty() {
            return Err(SnapshotError::EmptyTopology);
        }

        let members = with_uptime(source, members).await?;
        let coordinator = oldest(&members)
            .cloned()
            .ok_or(SnapshotError::EmptyTopology)?;
        let (clients, servers): (Vec<_>, Vec<_>) =
            members.into_iter().partition(|member| member.client);

        let rows = source
            .list_baseline_registry()
            .await
            .map_err(SnapshotError::fetch("baseline registry"))?;

        let NodeClassification {
            online_baseline,
            offline_baseline,
            non_baseline_online,
        } = classify(source, servers, &rows).await;

        let topology_version = read_topology_version(source, coordinator.node_id).await?;

        let rebalanced = source
            .rebalanced_flag()
            .await
            .map_err(SnapshotError::fetch("rebalanced flag"))?;

        let cluster_state = source
            .cluster_state()
            .await
            .map_err(SnapshotError::fetch("cluster state"))?;

        debug!(
            online = online_baseline.len(),
            offline = offline_baseline.len(),
            non_baseline = non_baseline_online.len(),
            clients = clients.len(),
            topology_version,
            "built topology snapshot"
        );

        Ok(TopologySnapshot {
            online_baseline,
            offline_baseline,
            non_baseline_online,
            clients,
            coordinator,
            topology_version,
            cluster_state,
            rebalanced,
        })
    }
}

fn oldest(members: &[ClusterMember]) -> Option<&ClusterMember> {
    members.iter().min_by_key(|member| member.order)
}

/// Read every member's uptime concurrently. A member that does not expose
/// the metric keeps `uptime == None`.
async fn with_uptime(
    source: &dyn ClusterMetadataSource,
    members: Vec<ClusterMember>,
) -> Result<Vec<ClusterMember>, SnapshotError> {
    let reads = members.iter().map(|member| source.read_metric(metrics::UPTIME, member.node_id));
    let uptimes = try_join_all(reads)
        .await
        .map_err(SnapshotError::fetch("uptime"))?;

    Ok(members
        .into_iter()
        .zip(uptimes)
        .map(|(mut member, uptime)| {
            member.uptime = uptime
                .and_then(|value| value.as_i64())
                .map(|millis| Duration::from_millis(millis.max(0) as u64));
            member
        })
        .collect())
}

async fn read_topology_version(
    source: &dyn ClusterMetadataSource,
    coordinator: NodeId,
) -> Result<i64, SnapshotError> {
    let value = source
        .read_metric(metrics::TOPOLOGY_VERSION, coordinator)
        .await
        .map_err(SnapshotError::fetch("topology version"))?
        .ok_or(SnapshotError::MissingMetric {
            name: metrics::TOPOLOGY_VERSION,
            node_id: coordinator,
        })?;

    value.as_i64().ok_or(SnapshotError::UnexpectedMetric {
        name: metrics::TOPOLOGY_VERSION,
        node_id: coordinator,
        value,
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::api::InMemoryMetadataSource;
    use crate::domain::BaselineRow;

    fn cluster() -> (Arc<InMemoryMetadataSource>, Vec<NodeId>) {
        let source = InMemoryMetadataSource::new();
        let mut ids = Vec::new();

        for (id, order) in [("a", 3), ("b", 1), ("c", 2)] {
            let member = ClusterMember::new(Uuid::new_v4(), id, order);
            ids.push(member.node_id);
            source.set_metric(metrics::UPTIME, member.node_id, MetricValue::Integer(61_000));
            source.add_member(member);
        }
        source.add_member(ClusterMember::new(Uuid::new_v4(), "client", 4).as_client());
        source.set_baseline(vec![
            BaselineRow::new("a", true),
            BaselineRow::new("b", true),
            BaselineRow::new("x", true),
        ]);
        // "b" joined first
        source.set_metric(metrics::TOPOLOGY_VERSION, ids[1], MetricValue::Integer(12));

        (Arc::new(source), ids)
    }

    fn builder(source: &Arc<InMemoryMetadataSource>) -> TopologySnapshotBuilder {
        TopologySnapshotBuilder::new(source.clone())
    }

    #[test]
    fn test_cluster_state_wire_names() {
        let state: ClusterState = serde_json::from_str("\"ACTIVE_READ_ONLY\"").unwrap();
        assert_eq!(state, ClusterState::ActiveReadOnly);
        assert_eq!(ClusterState::Inactive.to_string(), "INACTIVE");
    }

    #[tokio::test]
    async fn test_build_classifies_and_resolves_facts() {
        let (source, ids) = cluster();

        let snapshot = builder(&source).build().await.unwrap();

        assert_eq!(snapshot.online_baseline().len(), 2);
        assert_eq!(snapshot.offline_baseline(), &[OfflineMember::bare("x")]);
        assert_eq!(snapshot.non_baseline_online().len(), 1);
        assert_eq!(snapshot.clients().len(), 1);
        assert_eq!(snapshot.coordinator().node_id, ids[1]);
        assert_eq!(snapshot.topology_version(), 12);
        assert_eq!(snapshot.cluster_state(), ClusterState::Active);
        assert!(snapshot.rebalanced());
        assert_eq!(snapshot.servers().count(), 3);
    }

    #[tokio::test]
    async fn test_build_enriches_uptime() {
        let (source, _) = cluster();

        let snapshot = builder(&source).build().await.unwrap();

        assert!(snapshot
            .online_baseline()
            .iter()
            .all(|m| m.uptime == Some(Duration::from_secs(61))));
        assert_eq!(snapshot.clients()[0].uptime, None);
    }

    #[tokio::test]
    async fn test_oldest_member_is_coordinator_even_if_client() {
        let source = InMemoryMetadataSource::new();
        let server = ClusterMember::new(Uuid::new_v4(), "server", 5);
        let client = ClusterMember::new(Uuid::new_v4(), "client", 1).as_client();
        source.set_metric(metrics::TOPOLOGY_VERSION, client.node_id, MetricValue::Integer(7));
        source.add_member(server);
        source.add_member(client.clone());
        source.set_baseline(vec![BaselineRow::new("server", true)]);
        let source = Arc::new(source);

        let snapshot = builder(&source).build().await.unwrap();

        assert_eq!(snapshot.coordinator().node_id, client.node_id);
        assert!(snapshot.coordinator().client);
        assert_eq!(snapshot.topology_version(), 7);
        assert_eq!(snapshot.online_baseline().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_topology_fails() {
        let source = Arc::new(InMemoryMetadataSource::new());

        let result = builder(&source).build().await;

        assert!(matches!(result, Err(SnapshotError::EmptyTopology)));
    }

    #[tokio::test]
    async fn test_any_failed_fetch_fails_the_build() {
        for method in [
            "list_live_members",
            "list_baseline_registry",
            "read_metric",
            "cluster_state",
            "rebalanced_flag",
        ] {
            let (source, _) = cluster();
            source.fail_on(method);

            let result = builder(&source).build().await;

            assert!(
                matches!(result, Err(SnapshotError::Fetch { .. })),
                "{} should fail the build, got {:?}",
                method,
                result
            );
        }
    }

    #[tokio::test]
    async fn test_failed_attribute_lookup_does_not_fail_the_build() {
        let (source, _) = cluster();
        source.fail_on("lookup_attributes");

        let snapshot = builder(&source).build().await.unwrap();

        assert_eq!(snapshot.offline_baseline(), &[OfflineMember::bare("x")]);
    }

    #[tokio::test]
    async fn test_missing_topology_version_fails() {
        let (source, ids) = cluster();
        source.remove_metric(metrics::TOPOLOGY_VERSION, ids[1]);

        let result = builder(&source).build().await;

        assert!(matches!(result, Err(SnapshotError::MissingMetric { .. })));
    }

    #[tokio::test]
    async fn test_mistyped_topology_version_fails() {
        let (source, ids) = cluster();
        source.set_metric(metrics::TOPOLOGY_VERSION, ids[1], MetricValue::Flag(true));

        let result = builder(&source).build().await;

        assert!(matches!(result, Err(SnapshotError::UnexpectedMetric { .. })));
    }
}
