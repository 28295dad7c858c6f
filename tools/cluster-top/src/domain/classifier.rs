//! Reconciles live membership with the baseline registry.
//!
//! Every consistent id seen either live or in the registry lands in exactly
//! one of three buckets:
//!
//! ```text
//!   registry row online  + live member  -> online baseline
//!   registry row offline | no member    -> offline baseline
//!   live member without registry row    -> non-baseline online
//! ```

use std::collections::{BTreeSet, HashSet};

use tracing::warn;

use super::member::{BaselineRow, ClusterMember, OfflineMember};
use crate::api::{AttributeMap, ClusterMetadataSource, SourceError};

/// Persisted attribute holding an offline member's host names.
pub const HOST_NAMES_ATTR: &str = "comm.tcp.host.names";

/// Persisted attribute holding an offline member's addresses.
pub const ADDRESSES_ATTR: &str = "comm.tcp.addrs";

/// Result of classifying server members against the registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeClassification {
    pub online_baseline: Vec<ClusterMember>,
    pub offline_baseline: Vec<OfflineMember>,
    pub non_baseline_online: Vec<ClusterMember>,
}

/// First pass of the classification, before offline ids are resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub online_baseline: Vec<ClusterMember>,
    /// Canonical ids of offline baseline members, sorted and unique.
    pub offline_ids: BTreeSet<String>,
    pub non_baseline_online: Vec<ClusterMember>,
}

/// Split `live` members by the registry `rows`.
///
/// Ids are compared by canonical string form only. A row whose id was
/// already classified by an earlier row is skipped, and a live member whose
/// row says offline is counted as offline, so no id is ever reported twice.
pub fn partition(live: Vec<ClusterMember>, rows: &[BaselineRow]) -> Partition {
    let mut working = live;
    let mut seen = HashSet::new();
    let mut result = Partition::default();

    for row in rows {
        if !seen.insert(row.consistent_id.as_str()) {
            continue;
        }

        let matched = working
            .iter()
            .position(|member| member.consistent_id.matches(&row.consistent_id))
            .map(|idx| working.remove(idx));

        match matched {
            Some(member) if row.online => result.online_baseline.push(member),
            _ => {
                result.offline_ids.insert(row.consistent_id.clone());
            }
        }
    }

    result.non_baseline_online = working;
    result
}

/// Turn offline ids into [`OfflineMember`]s using the outcome of one batched
/// attribute lookup.
///
/// A failed lookup or an id missing from the result still yields a member,
/// just without attributes.
pub fn resolve_offline(
    ids: &BTreeSet<String>,
    lookup: Result<AttributeMap, SourceError>,
) -> Vec<OfflineMember> {
    let attrs = match lookup {
        Ok(attrs) => attrs,
        Err(e) => {
            warn!(error = %e, count = ids.len(), "offline member attribute lookup failed");
            AttributeMap::new()
        }
    };

    ids.iter()
        .map(|id| match attrs.get(id) {
            Some(values) => OfflineMember {
                consistent_id: id.clone(),
                host_names: values.get(HOST_NAMES_ATTR).cloned(),
                addresses: values.get(ADDRESSES_ATTR).cloned(),
            },
            None => OfflineMember::bare(id.as_str()),
        })
        .collect()
}

/// Classify live server members against the registry, resolving offline
/// members through a single batched lookup on `source`.
pub async fn classify<S>(
    source: &S,
    live: Vec<ClusterMember>,
    rows: &[BaselineRow],
) -> NodeClassification
where
    S: ClusterMetadataSource + ?Sized,
{
    let partition = partition(live, rows);

    let offline_baseline = if partition.offline_ids.is_empty() {
        Vec::new()
    } else {
        let ids: Vec<String> = partition.offline_ids.iter().cloned().collect();
        let lookup = source
            .lookup_attributes(&ids, &[HOST_NAMES_ATTR, ADDRESSES_ATTR])
            .await;
        resolve_offline(&partition.offline_ids, lookup)
    };

    NodeClassification {
        online_baseline: partition.online_baseline,
        offline_baseline,
        non_baseline_online: partition.non_baseline_online,
    }
}
