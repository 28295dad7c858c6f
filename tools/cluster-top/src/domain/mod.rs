//! Domain models and the topology reconciliation logic.

mod app;
mod classifier;
mod member;
pub mod metrics;
mod snapshot;
mod system;

pub use app::{App, AppState, Intent, Screen, Update};
pub use classifier::{
    classify, partition, resolve_offline, NodeClassification, Partition, ADDRESSES_ATTR,
    HOST_NAMES_ATTR,
};
pub use member::{BaselineRow, ClusterMember, ConsistentId, NodeId, OfflineMember};
pub use snapshot::{ClusterState, SnapshotError, TopologySnapshot, TopologySnapshotBuilder};
pub use system::{SystemMetricsCollector, SystemMetricsInfo};
