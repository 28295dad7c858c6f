//! Names of the scalar metrics the dashboard reads.

/// Milliseconds since the member started.
pub const UPTIME: &str = "sys.UpTime";

/// Topology version as seen by the coordinator.
pub const TOPOLOGY_VERSION: &str = "io.discovery.CurrentTopologyVersion";

/// Process CPU load, fraction of 1.
pub const CPU_LOAD: &str = "sys.CpuLoad";

/// OS load average. Some members report it as text.
pub const LOAD_AVERAGE: &str = "sys.SystemLoadAverage";

/// CPU spent in garbage collection, fraction of 1.
pub const GC_CPU_LOAD: &str = "sys.GcCpuLoad";

/// Heap bytes in use.
pub const HEAP_USED: &str = "sys.memory.heap.used";

/// Heap bytes available.
pub const HEAP_MAX: &str = "sys.memory.heap.max";

/// Bytes of persistent storage.
pub const STORAGE_SIZE: &str = "io.datastorage.StorageSize";

/// Configured data region names, comma separated text.
pub const DATA_REGION_NAMES: &str = "io.dataregion.Names";

/// Prefix of the per-region metrics: `io.dataregion.<region>.<metric>`.
pub const DATA_REGION_PREFIX: &str = "io.dataregion";

/// Off-heap bytes in use by a data region.
pub const DATA_REGION_USED: &str = "OffheapUsedSize";

/// Maximum off-heap bytes of a data region.
pub const DATA_REGION_MAX: &str = "MaxSize";

/// Full name of metric `metric` of data region `region`.
pub fn data_region_metric(region: &str, metric: &str) -> String {
    format!("{}.{}.{}", DATA_REGION_PREFIX, region, metric)
}
