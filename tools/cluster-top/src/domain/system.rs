//! Per-member system metrics.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;

use super::member::ClusterMember;
use super::metrics;
use super::snapshot::SnapshotError;
use crate::api::{ClusterMetadataSource, MetricValue, SourceError};

const GIGABYTE: f64 = (1u64 << 30) as f64;

/// System metrics of one server member.
///
/// A value the member does not report stays `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemMetricsInfo {
    pub consistent_id: String,
    pub host_names: String,
    pub cpu_load_percent: Option<f64>,
    pub load_average: Option<f64>,
    pub gc_cpu_load_percent: Option<f64>,
    pub heap_usage_percent: Option<f64>,
    /// Off-heap usage of each configured data region, by region name.
    pub data_region_usage_percent: BTreeMap<String, Option<f64>>,
    pub data_storage_gb: Option<f64>,
}

/// Reads [`SystemMetricsInfo`] for every live server member.
pub struct SystemMetricsCollector {
    source: Arc<dyn ClusterMetadataSource>,
}

impl SystemMetricsCollector {
    pub fn new(source: Arc<dyn ClusterMetadataSource>) -> Self {
        Self { source }
    }

    /// Server members in join order, each with its metrics. Any failed read
    /// fails the whole collection.
    pub async fn collect(&self) -> Result<Vec<SystemMetricsInfo>, SnapshotError> {
        let mut servers: Vec<ClusterMember> = self
            .source
            .list_live_members()
            .await
            .map_err(SnapshotError::fetch("live members"))?
            .into_iter()
            .filter(|member| !member.client)
            .collect();
        if servers.is_empty() {
            return Err(SnapshotError::EmptyTopology);
        }
        servers.sort_by_key(|member| member.order);

        try_join_all(servers.iter().map(|member| self.collect_one(member))).await
    }

    async fn collect_one(&self, member: &ClusterMember) -> Result<SystemMetricsInfo, SnapshotError> {
        let [cpu, load, gc, heap_used, heap_max, storage] = [
            metrics::CPU_LOAD,
            metrics::LOAD_AVERAGE,
            metrics::GC_CPU_LOAD,
            metrics::HEAP_USED,
            metrics::HEAP_MAX,
            metrics::STORAGE_SIZE,
        ]
        .map(|name| self.source.read_metric(name, member.node_id));

        let (cpu, load, gc, heap_used, heap_max, storage) =
            futures::try_join!(cpu, load, gc, heap_used, heap_max, storage)
                .map_err(SnapshotError::fetch("system metrics"))?;

        let data_region_usage_percent = self.data_region_usage(member).await?;

        Ok(SystemMetricsInfo {
            consistent_id: member.consistent_id.canonical(),
            host_names: member.host_names_display(),
            cpu_load_percent: as_f64(cpu).map(|load| load * 100.0),
            load_average: as_f64(load),
            gc_cpu_load_percent: as_f64(gc).map(|load| load * 100.0),
            heap_usage_percent: usage_percent(heap_used, heap_max),
            data_region_usage_percent,
            data_storage_gb: as_f64(storage).map(|bytes| bytes / GIGABYTE),
        })
    }

    async fn data_region_usage(
        &self,
        member: &ClusterMember,
    ) -> Result<BTreeMap<String, Option<f64>>, SnapshotError> {
        let node_id = member.node_id;
        let names = self
            .source
            .read_metric(metrics::DATA_REGION_NAMES, node_id)
            .await
            .map_err(SnapshotError::fetch("data region names"))?;
        let regions = names.as_ref().and_then(MetricValue::as_text).map(region_names).unwrap_or_default();

        let reads = regions.into_iter().map(|region| async move {
            let used_name = metrics::data_region_metric(&region, metrics::DATA_REGION_USED);
            let max_name = metrics::data_region_metric(&region, metrics::DATA_REGION_MAX);
            let (used, max) = futures::try_join!(
                self.source.read_metric(&used_name, node_id),
                self.source.read_metric(&max_name, node_id),
            )?;
            Ok::<_, SourceError>((region, usage_percent(used, max)))
        });

        let usage = try_join_all(reads)
            .await
            .map_err(SnapshotError::fetch("data region usage"))?;
        Ok(usage.into_iter().collect())
    }
}

/// Split a comma separated region list, dropping blanks.
fn region_names(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn usage_percent(used: Option<MetricValue>, max: Option<MetricValue>) -> Option<f64> {
    match (as_f64(used), as_f64(max)) {
        (Some(used), Some(max)) if max > 0.0 => Some(used / max * 100.0),
        _ => None,
    }
}

fn as_f64(value: Option<MetricValue>) -> Option<f64> {
    value.as_ref().and_then(MetricValue::as_f64)
}
