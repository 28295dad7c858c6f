//! Access to cluster metadata.
//!
//! `ClusterMetadataSource` is the port the dashboard reads through. The
//! JSON-RPC client talks to a live cluster, the in-memory source backs demo
//! mode and tests.

mod client;
mod demo;
mod source;
mod types;

pub use client::JsonRpcMetadataSource;
pub use demo::InMemoryMetadataSource;
pub use source::{AttributeMap, ClusterMetadataSource, SourceError};
pub use types::*;
