//! cluster-top: live terminal dashboard for cluster topology and node metrics.
//!
//! ## Usage
//!
//! ```bash
//! # Connect to the default endpoint
//! cluster-top
//!
//! # Canned demo cluster, starting on the system metrics screen
//! cluster-top --demo --screen system
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cluster_top::api::{ClusterMetadataSource, InMemoryMetadataSource, JsonRpcMetadataSource};
use cluster_top::ui::{keys, terminal};
use cluster_top::{logging, Args, Dashboard, DashboardConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = DashboardConfig::from_env().with_args(Args::parse());
    logging::init_logging(&config)?;

    let source: Arc<dyn ClusterMetadataSource> = if config.demo {
        info!("using demo cluster");
        Arc::new(InMemoryMetadataSource::demo())
    } else {
        info!(endpoint = %config.endpoint, "using JSON-RPC source");
        Arc::new(JsonRpcMetadataSource::new(
            config.endpoint.clone(),
            config.request_timeout,
        )?)
    };

    // Setup terminal with panic hook for cleanup
    terminal::install_panic_hook();
    let painter = terminal::setup_terminal()?;

    let cancel = CancellationToken::new();
    let (intent_tx, intent_rx) = mpsc::unbounded_channel();
    let key_reader = keys::spawn_key_reader(intent_tx, cancel.clone());

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut dashboard = Dashboard::new(source, painter, config.screen, config.refresh_interval);
    let result = dashboard.run(intent_rx, cancel.clone()).await;

    // Stop the key reader before giving the terminal back
    cancel.cancel();
    if let Err(e) = key_reader.await {
        warn!(error = %e, "key reader did not stop cleanly");
    }
    terminal::restore_terminal()?;

    info!("shutdown complete");

    result?;
    Ok(())
}
