//! End-to-end poll loop tests against the in-memory cluster and a test terminal.

use std::sync::Arc;
use std::time::Duration;

use ratatui::backend::TestBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cluster_top::api::InMemoryMetadataSource;
use cluster_top::domain::{ClusterState, Intent, Screen};
use cluster_top::ui::TerminalPainter;
use cluster_top::Dashboard;

const WIDTH: u16 = 120;
const HEIGHT: u16 = 40;

fn dashboard(source: Arc<InMemoryMetadataSource>, screen: Screen) -> Dashboard<TerminalPainter<TestBackend>> {
    let painter = TerminalPainter::new(TestBackend::new(WIDTH, HEIGHT)).unwrap();
    Dashboard::new(source, painter, screen, Duration::from_millis(100))
}

fn screen_rows(dashboard: &Dashboard<TerminalPainter<TestBackend>>) -> Vec<String> {
    let buffer = dashboard.painter().terminal().backend().buffer();
    (0..buffer.area.height)
        .map(|y| {
            let row: String = (0..buffer.area.width).map(|x| buffer[(x, y)].symbol()).collect();
            row.trim_end().to_string()
        })
        .collect()
}

fn row_index(rows: &[String], needle: &str) -> usize {
    rows.iter()
        .position(|row| row.contains(needle))
        .unwrap_or_else(|| panic!("no row contains {:?}: {:#?}", needle, rows))
}

// =============================================================================
// Topology screen
// =============================================================================

#[tokio::test]
async fn test_topology_screen_end_to_end() {
    let mut dashboard = dashboard(Arc::new(InMemoryMetadataSource::demo()), Screen::Topology);

    dashboard.tick().await.unwrap();
    let rows = screen_rows(&dashboard);

    assert!(rows[0].contains("<Topology>"));
    assert!(rows[1].starts_with("Version: 2.16.0  Coordinator: [node-1,node-1.cluster.local]"));
    assert!(rows[2].starts_with("State: ACTIVE  Topology version: 9  Rebalanced: true"));

    let online = row_index(&rows, "|Online baseline nodes|");
    let offline = row_index(&rows, "|Offline baseline nodes|");
    let non_baseline = row_index(&rows, "|Non-baseline server nodes|");
    let clients = row_index(&rows, "|Client nodes|");
    assert!(online < offline && offline < non_baseline && non_baseline < clients);

    // node-4 is registered but not live
    let node_4 = row_index(&rows, "node-4.cluster.local");
    assert!(offline < node_4 && node_4 < non_baseline);
    // node-5 is live but not registered
    let node_5 = row_index(&rows, "10.0.0.15");
    assert!(non_baseline < node_5 && node_5 < clients);
    assert!(row_index(&rows, "client-1") > clients);

    assert_eq!(rows[online + 5], "Total items: 3");
    assert!(rows
        .iter()
        .any(|row| row.starts_with("[Topology] Refreshed:")));
}

#[tokio::test]
async fn test_sorting_applies_to_every_table_and_survives_refresh() {
    let mut dashboard = dashboard(Arc::new(InMemoryMetadataSource::demo()), Screen::Topology);
    dashboard.tick().await.unwrap();

    // Consistent ID column, pressed twice: descending
    dashboard.handle(Intent::SortBy(1)).await.unwrap();
    dashboard.handle(Intent::SortBy(1)).await.unwrap();
    let rows = screen_rows(&dashboard);
    assert!(row_index(&rows, "10.0.0.13") < row_index(&rows, "10.0.0.11"));
    assert!(rows[row_index(&rows, "|Online baseline nodes|") + 1].contains("Consistent ID▽"));

    dashboard.tick().await.unwrap();
    let rows = screen_rows(&dashboard);
    assert!(row_index(&rows, "10.0.0.13") < row_index(&rows, "10.0.0.11"));
}

#[tokio::test]
async fn test_membership_changes_show_up_on_next_tick() {
    let source = Arc::new(InMemoryMetadataSource::demo());
    let mut dashboard = dashboard(source.clone(), Screen::Topology);
    dashboard.tick().await.unwrap();

    source.remove_member("node-2");
    source.set_state(ClusterState::ActiveReadOnly);
    dashboard.tick().await.unwrap();

    let rows = screen_rows(&dashboard);
    assert!(rows[2].starts_with("State: ACTIVE_READ_ONLY"));
    let offline = row_index(&rows, "|Offline baseline nodes|");
    let non_baseline = row_index(&rows, "|Non-baseline server nodes|");
    let node_2 = row_index(&rows, "node-2");
    assert!(offline < node_2 && node_2 < non_baseline);
}

#[tokio::test]
async fn test_failure_keeps_screen_and_reports_error() {
    let source = Arc::new(InMemoryMetadataSource::demo());
    let mut dashboard = dashboard(source.clone(), Screen::Topology);
    dashboard.tick().await.unwrap();

    source.fail_on("list_baseline_registry");
    dashboard.tick().await.unwrap();

    let rows = screen_rows(&dashboard);
    assert!(rows[0].contains("<Topology>"));
    assert!(row_index(&rows, "node-4.cluster.local") > 0);
    assert!(rows.iter().any(|row| row.contains("Error:")));
}

#[tokio::test]
async fn test_offline_attribute_failure_degrades_rows() {
    let source = Arc::new(InMemoryMetadataSource::demo());
    source.fail_on("lookup_attributes");
    let mut dashboard = dashboard(source, Screen::Topology);

    dashboard.tick().await.unwrap();

    let rows = screen_rows(&dashboard);
    assert!(!rows.iter().any(|row| row.contains("node-4.cluster.local")));
    let offline = row_index(&rows, "|Offline baseline nodes|");
    assert!(rows[offline + 2].starts_with("node-4"));
    assert!(!rows.iter().any(|row| row.contains("Error:")));
}

// =============================================================================
// Poll loop
// =============================================================================

#[tokio::test]
async fn test_run_switches_screen_and_quits() {
    let mut dashboard = dashboard(Arc::new(InMemoryMetadataSource::demo()), Screen::Topology);
    let (tx, rx) = mpsc::unbounded_channel();

    let keys = async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        tx.send(Intent::Show(Screen::SystemMetrics)).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        tx.send(Intent::Quit).unwrap();
    };

    let (result, _) = tokio::join!(dashboard.run(rx, CancellationToken::new()), keys);

    result.unwrap();
    assert!(dashboard.app().should_quit());
    let rows = screen_rows(&dashboard);
    assert!(rows[0].contains("<System metrics>"));
    assert!(rows[2].starts_with("ConsID"));
    // four servers, client excluded
    assert!(rows.iter().any(|row| row == "Total items: 4"));
}

#[tokio::test]
async fn test_run_stops_on_cancel_after_keys_are_gone() {
    let mut dashboard = dashboard(Arc::new(InMemoryMetadataSource::demo()), Screen::Topology);
    let (tx, rx) = mpsc::unbounded_channel::<Intent>();
    drop(tx);
    let cancel = CancellationToken::new();

    let stopper = {
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            cancel.cancel();
        }
    };

    let (result, _) = tokio::join!(dashboard.run(rx, cancel), stopper);

    result.unwrap();
    assert!(!dashboard.app().should_quit());
    assert!(dashboard.app().last_refresh.is_some());
}
