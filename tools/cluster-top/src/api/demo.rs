//! In-memory metadata source for demo mode and tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use uuid::Uuid;

use super::source::{AttributeMap, ClusterMetadataSource, SourceError};
use super::types::MetricValue;
use crate::domain::{
    metrics, BaselineRow, ClusterMember, ClusterState, NodeId, ADDRESSES_ATTR, HOST_NAMES_ATTR,
};

#[derive(Debug, Default)]
struct Inner {
    members: Vec<ClusterMember>,
    baseline: Vec<BaselineRow>,
    attributes: AttributeMap,
    metrics: HashMap<(String, NodeId), MetricValue>,
    state: ClusterState,
    rebalanced: bool,
    failing: HashSet<String>,
    calls: HashMap<String, usize>,
    /// When set, uptime metrics grow with wall-clock time from this instant.
    clock: Option<Instant>,
}

/// Cluster metadata held in memory.
///
/// Every trait method can be made to fail with [`fail_on`](Self::fail_on),
/// and calls are counted per method name.
#[derive(Debug, Default)]
pub struct InMemoryMetadataSource {
    inner: Mutex<Inner>,
}

impl InMemoryMetadataSource {
    /// Empty, active, rebalanced cluster.
    pub fn new() -> Self {
        let source = Self::default();
        {
            let mut inner = source.lock();
            inner.state = ClusterState::Active;
            inner.rebalanced = true;
        }
        source
    }

    /// A small canned cluster with an offline baseline member, a server
    /// outside the baseline and a client.
    pub fn demo() -> Self {
        let source = Self::new();

        let servers = [
            ("node-1", 1, "10.0.0.11", 93_784_000_i64),
            ("node-2", 2, "10.0.0.12", 86_400_000),
            ("node-3", 3, "10.0.0.13", 3_723_000),
            ("node-5", 6, "10.0.0.15", 59_000),
        ];

        for (id, order, addr, uptime_ms) in servers {
            let member = ClusterMember::new(Uuid::new_v4(), id, order)
                .with_version("2.16.0")
                .with_host_names([format!("{}.cluster.local", id)])
                .with_addresses([addr, "127.0.0.1"]);
            let node_id = member.node_id;
            source.add_member(member);

            source.set_metric(metrics::UPTIME, node_id, MetricValue::Integer(uptime_ms));
            source.set_metric(metrics::CPU_LOAD, node_id, MetricValue::Decimal(0.05 * order as f64));
            source.set_metric(
                metrics::LOAD_AVERAGE,
                node_id,
                MetricValue::Text(format!("{:.2}", 0.4 * order as f64)),
            );
            source.set_metric(metrics::GC_CPU_LOAD, node_id, MetricValue::Decimal(0.001 * order as f64));
            source.set_metric(metrics::HEAP_USED, node_id, MetricValue::Integer(512 * 1024 * 1024 * order as i64));
            source.set_metric(metrics::HEAP_MAX, node_id, MetricValue::Integer(4 * 1024 * 1024 * 1024));
            source.set_metric(
                metrics::STORAGE_SIZE,
                node_id,
                MetricValue::Integer(3 * 1024 * 1024 * 1024 * order as i64),
            );

            source.set_metric(
                metrics::DATA_REGION_NAMES,
                node_id,
                MetricValue::Text("default,persistence".to_string()),
            );
            for (region, used_mb) in [("default", 64 * order as i64), ("persistence", 300)] {
                source.set_metric(
                    &metrics::data_region_metric(region, metrics::DATA_REGION_USED),
                    node_id,
                    MetricValue::Integer(used_mb * 1024 * 1024),
                );
                source.set_metric(
                    &metrics::data_region_metric(region, metrics::DATA_REGION_MAX),
                    node_id,
                    MetricValue::Integer(1024 * 1024 * 1024),
                );
            }

            if order == 1 {
                source.set_metric(metrics::TOPOLOGY_VERSION, node_id, MetricValue::Integer(9));
            }
        }

        let client = ClusterMember::new(Uuid::new_v4(), "client-1", 7)
            .with_version("2.16.0")
            .with_host_names(["app.cluster.local"])
            .with_addresses(["10.0.1.20"])
            .as_client();
        let client_id = client.node_id;
        source.add_member(client);
        source.set_metric(metrics::UPTIME, client_id, MetricValue::Integer(1_500_000));

        source.set_baseline(vec![
            BaselineRow::new("node-1", true),
            BaselineRow::new("node-2", true),
            BaselineRow::new("node-3", true),
            BaselineRow::new("node-4", false),
        ]);
        source.set_attributes(
            "node-4",
            HashMap::from([
                (HOST_NAMES_ATTR.to_string(), "node-4.cluster.local".to_string()),
                (ADDRESSES_ATTR.to_string(), "10.0.0.14, 127.0.0.1".to_string()),
            ]),
        );

        source.lock().clock = Some(Instant::now());
        source
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_member(&self, member: ClusterMember) {
        self.lock().members.push(member);
    }

    pub fn set_members(&self, members: Vec<ClusterMember>) {
        self.lock().members = members;
    }

    /// Drop a live member, as if it left the topology.
    pub fn remove_member(&self, consistent_id: &str) {
        self.lock()
            .members
            .retain(|member| !member.consistent_id.matches(consistent_id));
    }

    pub fn set_baseline(&self, rows: Vec<BaselineRow>) {
        self.lock().baseline = rows;
    }

    pub fn set_attributes(&self, consistent_id: &str, attributes: HashMap<String, String>) {
        self.lock()
            .attributes
            .insert(consistent_id.to_string(), attributes);
    }

    pub fn set_metric(&self, name: &str, node_id: NodeId, value: MetricValue) {
        self.lock().metrics.insert((name.to_string(), node_id), value);
    }

    pub fn remove_metric(&self, name: &str, node_id: NodeId) {
        self.lock().metrics.remove(&(name.to_string(), node_id));
    }

    pub fn set_state(&self, state: ClusterState) {
        self.lock().state = state;
    }

    pub fn set_rebalanced(&self, rebalanced: bool) {
        self.lock().rebalanced = rebalanced;
    }

    /// Make every call of `method` fail until [`recover`](Self::recover).
    pub fn fail_on(&self, method: &str) {
        self.lock().failing.insert(method.to_string());
    }

    pub fn recover(&self, method: &str) {
        self.lock().failing.remove(method);
    }

    /// Number of times `method` was called, failed calls included.
    pub fn call_count(&self, method: &str) -> usize {
        self.lock().calls.get(method).copied().unwrap_or(0)
    }

    /// Record a call of `method` and return the guard, or the injected error.
    fn enter(&self, method: &str) -> Result<MutexGuard<'_, Inner>, SourceError> {
        let mut inner = self.lock();
        *inner.calls.entry(method.to_string()).or_default() += 1;

        if inner.failing.contains(method) {
            return Err(SourceError::Unavailable(format!("{} failed", method)));
        }

        Ok(inner)
    }
}

#[async_trait]
impl ClusterMetadataSource for InMemoryMetadataSource {
    async fn list_live_members(&self) -> Result<Vec<ClusterMember>, SourceError> {
        Ok(self.enter("list_live_members")?.members.clone())
    }

    async fn list_baseline_registry(&self) -> Result<Vec<BaselineRow>, SourceError> {
        Ok(self.enter("list_baseline_registry")?.baseline.clone())
    }

    async fn lookup_attributes(
        &self,
        ids: &[String],
        attr_names: &[&str],
    ) -> Result<AttributeMap, SourceError> {
        let inner = self.enter("lookup_attributes")?;

        let found = ids
            .iter()
            .filter_map(|id| {
                let values: HashMap<String, String> = inner
                    .attributes
                    .get(id)?
                    .iter()
                    .filter(|(name, _)| attr_names.contains(&name.as_str()))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                Some((id.clone(), values))
            })
            .collect();

        Ok(found)
    }

    async fn read_metric(
        &self,
        name: &str,
        node_id: NodeId,
    ) -> Result<Option<MetricValue>, SourceError> {
        let inner = self.enter("read_metric")?;
        let value = inner.metrics.get(&(name.to_string(), node_id)).cloned();

        let value = match (value, inner.clock) {
            (Some(MetricValue::Integer(base)), Some(started)) if name == metrics::UPTIME => {
                let elapsed = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
                Some(MetricValue::Integer(base.saturating_add(elapsed)))
            }
            (value, _) => value,
        };

        Ok(value)
    }

    async fn cluster_state(&self) -> Result<ClusterState, SourceError> {
        Ok(self.enter("cluster_state")?.state)
    }

    async fn rebalanced_flag(&self) -> Result<bool, SourceError> {
        Ok(self.enter("rebalanced_flag")?.rebalanced)
    }
}
