//! Dashboard configuration from environment variables and command line flags.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::domain::Screen;

/// Lower bound for the refresh interval.
pub const MIN_REFRESH: Duration = Duration::from_millis(100);

/// Configuration for one dashboard run.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// JSON-RPC endpoint serving cluster metadata
    pub endpoint: String,

    /// Delay between the end of one refresh and the start of the next
    pub refresh_interval: Duration,

    /// Per-request timeout for the JSON-RPC source
    pub request_timeout: Duration,

    /// Serve a canned in-memory cluster instead of the endpoint
    pub demo: bool,

    /// Log filter directive (trace, debug, info, warn, error, or a full `EnvFilter`)
    pub log_level: String,

    /// File receiving log output. Logs are discarded when unset.
    pub log_file: Option<PathBuf>,

    /// Screen shown at startup
    pub screen: Screen,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080/rpc".to_string(),
            refresh_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_millis(5000),
            demo: false,
            log_level: "info".to_string(),
            log_file: None,
            screen: Screen::Topology,
        }
    }
}

impl DashboardConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CLUSTER_TOP_ENDPOINT`: Metadata endpoint (default: http://127.0.0.1:8080/rpc)
    /// - `CLUSTER_TOP_REFRESH_MS`: Refresh interval in ms (default: 1000, min: 100)
    /// - `CLUSTER_TOP_TIMEOUT_MS`: Request timeout in ms (default: 5000)
    /// - `CLUSTER_TOP_DEMO`: Use the demo cluster (default: false)
    /// - `CLUSTER_TOP_LOG` or `RUST_LOG`: Log filter (default: info)
    /// - `CLUSTER_TOP_LOG_FILE`: Log file path (default: none)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            endpoint: lookup("CLUSTER_TOP_ENDPOINT").unwrap_or(defaults.endpoint),

            refresh_interval: millis("CLUSTER_TOP_REFRESH_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.refresh_interval)
                .max(MIN_REFRESH),

            request_timeout: millis("CLUSTER_TOP_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),

            demo: lookup("CLUSTER_TOP_DEMO")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.demo),

            log_level: lookup("CLUSTER_TOP_LOG")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            log_file: lookup("CLUSTER_TOP_LOG_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),

            screen: defaults.screen,
        }
    }

    /// Apply command line flags on top of this configuration.
    pub fn with_args(mut self, args: Args) -> Self {
        if let Some(endpoint) = args.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(ms) = args.refresh_ms {
            self.refresh_interval = Duration::from_millis(ms).max(MIN_REFRESH);
        }
        if let Some(ms) = args.timeout_ms {
            self.request_timeout = Duration::from_millis(ms);
        }
        if args.demo {
            self.demo = true;
        }
        if let Some(level) = args.log_level {
            self.log_level = level;
        }
        if let Some(path) = args.log_file {
            self.log_file = Some(path);
        }
        self.screen = args.screen;
        self
    }
}

/// Live terminal dashboard for cluster topology and node metrics
#[derive(Parser, Debug)]
#[command(name = "cluster-top")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON-RPC endpoint URL
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Refresh interval in milliseconds
    #[arg(short, long)]
    pub refresh_ms: Option<u64>,

    /// Request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Run against a canned demo cluster (no endpoint required)
    #[arg(long)]
    pub demo: bool,

    /// Log filter, e.g. `debug` or `cluster_top=trace`
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Screen shown at startup (topology or system)
    #[arg(short, long, default_value = "topology")]
    pub screen: Screen,
}
