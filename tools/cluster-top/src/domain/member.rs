//! Cluster member models.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Runtime identifier of a live member. Changes every time a member restarts.
pub type NodeId = Uuid;

/// Logical identity of a member.
///
/// The live view and the persisted baseline registry may carry the same
/// identity in different concrete shapes (a UUID in one, a string in the
/// other). Identities are therefore only ever compared through
/// [`ConsistentId::canonical`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConsistentId {
    /// Numeric identity.
    Integer(i64),
    /// UUID identity.
    Uuid(Uuid),
    /// Free-form identity (host:port, configured name, ...).
    Text(String),
}

impl ConsistentId {
    /// Canonical string form used for all identity comparisons.
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Returns `true` if this identity denotes the given canonical string.
    pub fn matches(&self, canonical: &str) -> bool {
        match self {
            ConsistentId::Text(text) => text == canonical,
            other => other.canonical() == canonical,
        }
    }
}

impl fmt::Display for ConsistentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistentId::Integer(value) => write!(f, "{}", value),
            ConsistentId::Uuid(value) => write!(f, "{}", value.hyphenated()),
            ConsistentId::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for ConsistentId {
    fn from(value: &str) -> Self {
        ConsistentId::Text(value.to_string())
    }
}

impl From<String> for ConsistentId {
    fn from(value: String) -> Self {
        ConsistentId::Text(value)
    }
}

impl From<Uuid> for ConsistentId {
    fn from(value: Uuid) -> Self {
        ConsistentId::Uuid(value)
    }
}

/// A member currently present in the cluster topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMember {
    pub node_id: NodeId,
    pub consistent_id: ConsistentId,
    /// Join order. Lower values joined earlier.
    pub order: u64,
    /// Product version string reported by the member.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub host_names: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Member runs in client mode and never holds data.
    #[serde(default)]
    pub client: bool,
    /// Filled in from the uptime metric while a snapshot is built.
    #[serde(skip)]
    pub uptime: Option<Duration>,
}

impl ClusterMember {
    /// Create a server member without uptime information.
    pub fn new(node_id: NodeId, consistent_id: impl Into<ConsistentId>, order: u64) -> Self {
        Self {
            node_id,
            consistent_id: consistent_id.into(),
            order,
            version: String::new(),
            host_names: Vec::new(),
            addresses: Vec::new(),
            client: false,
            uptime: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_host_names<I, S>(mut self, host_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.host_names = host_names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    pub fn as_client(mut self) -> Self {
        self.client = true;
        self
    }

    pub fn with_uptime(mut self, uptime: Duration) -> Self {
        self.uptime = Some(uptime);
        self
    }

    /// Host names joined for display.
    pub fn host_names_display(&self) -> String {
        self.host_names.join(", ")
    }

    /// Addresses joined for display.
    pub fn addresses_display(&self) -> String {
        self.addresses.join(", ")
    }
}

/// A baseline member that is not reachable right now.
///
/// Only persisted attributes are known, and even those may be missing when
/// the attribute lookup failed for this id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OfflineMember {
    pub consistent_id: String,
    pub host_names: Option<String>,
    pub addresses: Option<String>,
}

impl OfflineMember {
    /// Offline member with no known attributes.
    pub fn bare(consistent_id: impl Into<String>) -> Self {
        Self {
            consistent_id: consistent_id.into(),
            host_names: None,
            addresses: None,
        }
    }
}

/// One row of the cluster's baseline registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineRow {
    /// Consistent id in its persisted (string) form.
    pub consistent_id: String,
    pub online: bool,
}

impl BaselineRow {
    pub fn new(consistent_id: impl Into<String>, online: bool) -> Self {
        Self {
            consistent_id: consistent_id.into(),
            online,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_and_text_ids_share_canonical_form() {
        let uuid = Uuid::new_v4();
        let live = ConsistentId::Uuid(uuid);
        let persisted = uuid.hyphenated().to_string();

        assert_ne!(live, ConsistentId::Text(persisted.clone()));
        assert!(live.matches(&persisted));
        assert_eq!(live.canonical(), persisted);
    }

    #[test]
    fn test_integer_id_matches_string_form() {
        assert!(ConsistentId::Integer(42).matches("42"));
        assert!(!ConsistentId::Integer(42).matches("042"));
    }

    #[test]
    fn test_untagged_deserialization_picks_narrowest_shape() {
        let id: ConsistentId = serde_json::from_str("7").unwrap();
        assert_eq!(id, ConsistentId::Integer(7));

        let id: ConsistentId =
            serde_json::from_str("\"1b4e28ba-2fa1-11d2-883f-0016d3cca427\"").unwrap();
        assert!(matches!(id, ConsistentId::Uuid(_)));

        let id: ConsistentId = serde_json::from_str("\"node-1:47500\"").unwrap();
        assert_eq!(id, ConsistentId::Text("node-1:47500".to_string()));
    }

    #[test]
    fn test_member_display_helpers() {
        let member = ClusterMember::new(Uuid::new_v4(), "node-1", 1)
            .with_host_names(["host-a", "host-b"])
            .with_addresses(["10.0.0.1"]);

        assert_eq!(member.host_names_display(), "host-a, host-b");
        assert_eq!(member.addresses_display(), "10.0.0.1");
        assert!(!member.client);
        assert_eq!(member.uptime, None);
    }
}
