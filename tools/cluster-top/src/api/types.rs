//! Wire types of the cluster metadata JSON-RPC endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::NodeId;

/// Scalar metric value as the cluster reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Flag(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl MetricValue {
    /// Integer view. Decimals are truncated, numeric text is parsed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetricValue::Integer(value) => Some(*value),
            MetricValue::Decimal(value) if value.is_finite() => Some(*value as i64),
            MetricValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Floating point view. Numeric text is parsed, since some clusters
    /// report load averages as strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Integer(value) => Some(*value as f64),
            MetricValue::Decimal(value) => Some(*value),
            MetricValue::Text(text) => text.trim().parse().ok(),
            MetricValue::Flag(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetricValue::Flag(value) => Some(*value),
            MetricValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetricValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Params of `cluster_baselineAttributes`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeQuery<'a> {
    pub consistent_ids: &'a [String],
    pub attributes: &'a [&'a str],
}

/// One (consistent id, attribute, value) triple of `cluster_baselineAttributes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRow {
    pub consistent_id: String,
    pub name: String,
    pub value: String,
}

/// Params of `cluster_metric`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricQuery<'a> {
    pub name: &'a str,
    pub node_id: NodeId,
}

/// JSON-RPC request structure
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<T> {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: T,
    pub id: u64,
}

impl<T> JsonRpcRequest<T> {
    pub fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC response structure. The envelope `jsonrpc` and `id` are not
/// checked since every HTTP response answers exactly one request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC Error {}: {}", self.code, self.message)
    }
}
