//! cluster-top: live terminal dashboard for a distributed cluster.
//!
//! Shows which members are live, how they relate to the persisted baseline
//! registry, and per-member system metrics, refreshed on a fixed delay.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  Intent   ┌────────────────────────────────────────────┐
//! │ key reader   │ ────────▶ │ Dashboard (poll loop)                      │
//! │ (blocking)   │  channel  │  TopologySnapshotBuilder / MetricsCollector│
//! └──────────────┘           │        │ NodeClassifier                    │
//!                            │        ▼                                   │
//!                            │  screens ─▶ Component ─▶ RenderPipeline    │
//!                            │                  TableLayout / Grid        │
//!                            └──────────────┬─────────────────────────────┘
//!                                           │ Painter
//!                                           ▼
//!                                      terminal
//! ```
//!
//! - `api`: the `ClusterMetadataSource` port plus JSON-RPC and in-memory adapters
//! - `domain`: members, classification, snapshots, application state
//! - `ui`: layout, tables, components, rendering and terminal I/O
//! - `dashboard`: the poll loop tying the layers together

pub mod api;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod logging;
pub mod ui;

pub use config::{Args, DashboardConfig};
pub use dashboard::{Dashboard, DashboardError};
