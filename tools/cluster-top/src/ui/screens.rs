//! Turns domain data into screen components.

use std::collections::BTreeSet;

use ratatui::style::Color;

use super::component::{Banner, Component, Label};
use super::layout::LayoutError;
use super::table::{CellValue, SortableDataGrid, Table};
use crate::domain::{
    App, AppState, ClusterMember, ClusterState, OfflineMember, SystemMetricsInfo, TopologySnapshot,
};

const MEMBER_HEADER: [&str; 5] = ["Order", "Consistent ID", "Host names", "IP addresses", "Uptime"];
const OFFLINE_HEADER: [&str; 3] = ["Consistent ID", "Host names", "IP addresses"];
/// Columns before the per-region usage columns.
const SYSTEM_HEADER: [&str; 6] = ["ConsID", "HostNames", "CPU%", "LoadAvg", "GC_CPU%", "Heap%"];
const STORAGE_HEADER: &str = "DStorageGB";

/// Key bindings shown on the help screen.
pub const KEY_BINDINGS: [(&str, &str); 6] = [
    ("t", "Topology screen"),
    ("s", "System metrics screen"),
    ("1-9", "Sort by column N, again to reverse"),
    ("? h", "Toggle this help"),
    ("q Esc", "Quit"),
    ("Ctrl-C", "Quit"),
];

fn state_color(state: ClusterState) -> Color {
    match state {
        ClusterState::Inactive => Color::Red,
        ClusterState::Active | ClusterState::ActiveReadOnly => Color::Green,
    }
}

fn flag_color(flag: bool) -> Color {
    if flag {
        Color::Green
    } else {
        Color::Red
    }
}

fn grid(header: &[&str], rows: Vec<Vec<CellValue>>) -> Result<Component, LayoutError> {
    let table = Table::new(header.iter().copied(), rows)?;
    Ok(SortableDataGrid::new(table).into())
}

fn members_table(members: &[ClusterMember]) -> Result<Component, LayoutError> {
    let rows = members
        .iter()
        .map(|member| {
            vec![
                CellValue::from(member.order),
                CellValue::from(member.consistent_id.canonical()),
                CellValue::from(member.host_names_display()),
                CellValue::from(member.addresses_display()),
                CellValue::from(member.uptime),
            ]
        })
        .collect();

    grid(&MEMBER_HEADER, rows)
}

fn offline_table(members: &[OfflineMember]) -> Result<Component, LayoutError> {
    let rows = members
        .iter()
        .map(|member| {
            vec![
                CellValue::from(member.consistent_id.clone()),
                CellValue::from(member.host_names.clone()),
                CellValue::from(member.addresses.clone()),
            ]
        })
        .collect();

    grid(&OFFLINE_HEADER, rows)
}

/// Title, cluster facts, then one section per member category.
pub fn topology(snapshot: &TopologySnapshot) -> Result<Vec<Component>, LayoutError> {
    let coordinator = snapshot.coordinator();
    let state = snapshot.cluster_state();

    let mut components: Vec<Component> = vec![
        Banner::title("Topology").into(),
        Label::normal("Version:")
            .bold(&coordinator.version)
            .spaces(2)
            .normal("Coordinator:")
            .bold(format!(
                "[{},{}]",
                coordinator.consistent_id,
                coordinator.host_names_display()
            ))
            .into(),
        Label::normal("State:")
            .color(state_color(state))
            .bold(state)
            .spaces(2)
            .normal("Topology version:")
            .bold(snapshot.topology_version())
            .spaces(2)
            .normal("Rebalanced:")
            .color(flag_color(snapshot.rebalanced()))
            .bold(snapshot.rebalanced())
            .into(),
        Component::Spacer(2),
    ];

    let sections = [
        ("Online baseline nodes", members_table(snapshot.online_baseline())?),
        ("Offline baseline nodes", offline_table(snapshot.offline_baseline())?),
        ("Non-baseline server nodes", members_table(snapshot.non_baseline_online())?),
        ("Client nodes", members_table(snapshot.clients())?),
    ];

    for (title, table) in sections {
        components.push(Banner::section(title).into());
        components.push(table);
        components.push(Component::Spacer(2));
    }

    Ok(components)
}

/// One row per server member.
/// One `DataReg%:<region>` column per region any member reports, sorted by
/// name. A member without that region leaves the cell empty.
pub fn system_metrics(metrics: &[SystemMetricsInfo]) -> Result<Vec<Component>, LayoutError> {
    let regions: BTreeSet<&str> = metrics
        .iter()
        .flat_map(|info| info.data_region_usage_percent.keys())
        .map(String::as_str)
        .collect();

    let header: Vec<String> = SYSTEM_HEADER
        .iter()
        .map(|name| name.to_string())
        .chain(regions.iter().map(|region| format!("DataReg%:{}", region)))
        .chain([STORAGE_HEADER.to_string()])
        .collect();

    let rows = metrics
        .iter()
        .map(|info| {
            let mut row = vec![
                CellValue::from(info.consistent_id.clone()),
                CellValue::from(info.host_names.clone()),
                CellValue::from(info.cpu_load_percent),
                CellValue::from(info.load_average),
                CellValue::from(info.gc_cpu_load_percent),
                CellValue::from(info.heap_usage_percent),
            ];
            row.extend(regions.iter().map(|region| {
                CellValue::from(info.data_region_usage_percent.get(*region).copied().flatten())
            }));
            row.push(CellValue::from(info.data_storage_gb));
            row
        })
        .collect();

    let table = Table::new(header, rows)?;
    Ok(vec![
        Banner::title("System metrics").into(),
        Component::Spacer(1),
        SortableDataGrid::new(table).into(),
        Component::Spacer(1),
    ])
}

pub fn help() -> Vec<Component> {
    let mut components: Vec<Component> = vec![Banner::title("Help").into(), Component::Spacer(1)];

    components.extend(KEY_BINDINGS.iter().map(|(keys, action)| {
        Component::from(Label::bold(format!("{:>8}", keys)).spaces(2).normal(action))
    }));
    components.push(Component::Spacer(1));
    components.push(Label::plain("Press any key to return").into());

    components
}

/// Bottom line: current screen, last refresh, last error.
pub fn status(app: &App) -> Component {
    let screen = match app.state {
        AppState::Help => "Help",
        _ => app.screen.title(),
    };

    let refreshed = match app.last_refresh {
        Some(at) => at.format("%H:%M:%S").to_string(),
        None => "never".to_string(),
    };

    let mut label = Label::normal(format!("[{}]", screen))
        .normal("Refreshed:")
        .bold(refreshed);

    if let Some(error) = &app.error_message {
        label = label.spaces(2).color(Color::Red).normal(format!("Error: {}", error));
    }

    label.into()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;
    use crate::api::{InMemoryMetadataSource, MetricValue};
    use crate::domain::{metrics, BaselineRow, Screen, TopologySnapshotBuilder};
    use crate::ui::pipeline::{plain_text, RenderPipeline};

    async fn snapshot() -> TopologySnapshot {
        let source = InMemoryMetadataSource::new();
        let member = ClusterMember::new(Uuid::new_v4(), "node-1", 1)
            .with_version("2.16.0")
            .with_host_names(["host-1"])
            .with_addresses(["10.0.0.1"]);
        source.set_metric(metrics::TOPOLOGY_VERSION, member.node_id, MetricValue::Integer(4));
        source.set_metric(metrics::UPTIME, member.node_id, MetricValue::Integer(3_723_000));
        source.add_member(member);
        source.set_baseline(vec![BaselineRow::new("node-1", true), BaselineRow::new("node-2", true)]);
        source.set_state(ClusterState::Inactive);

        TopologySnapshotBuilder::new(Arc::new(source))
            .build()
            .await
            .unwrap()
    }

    fn render(components: Vec<Component>, width: usize) -> Vec<String> {
        let mut pipeline = RenderPipeline::new();
        pipeline.set_components(components);
        pipeline.render(width).iter().map(plain_text).collect()
    }

    #[tokio::test]
    async fn test_topology_screen_sections() {
        let lines = render(topology(&snapshot().await).unwrap(), 120);

        assert!(lines[0].contains("<Topology>"));
        assert!(lines[1].starts_with("Version: 2.16.0  Coordinator: [node-1,host-1]"));
        assert!(lines[2].starts_with("State: INACTIVE  Topology version: 4  Rebalanced: true"));
        for section in [
            "|Online baseline nodes|",
            "|Offline baseline nodes|",
            "|Non-baseline server nodes|",
            "|Client nodes|",
        ] {
            assert!(lines.iter().any(|line| line.contains(section)), "missing {}", section);
        }
        assert!(lines.iter().any(|line| line.contains("0d 1h 2m 3s")));
        assert!(lines.iter().any(|line| line.starts_with("node-2")));
    }

    #[tokio::test]
    async fn test_inactive_state_is_red() {
        let components = topology(&snapshot().await).unwrap();

        let Component::Label(label) = &components[2] else {
            panic!("expected the state label");
        };
        assert_eq!(label.spans()[2].style.fg, Some(Color::Red));
    }

    #[test]
    fn test_system_metrics_screen() {
        let info = SystemMetricsInfo {
            consistent_id: "node-1".into(),
            host_names: "host-1".into(),
            cpu_load_percent: Some(12.34),
            load_average: Some(0.5),
            gc_cpu_load_percent: None,
            heap_usage_percent: Some(50.0),
            data_region_usage_percent: BTreeMap::new(),
            data_storage_gb: Some(1.0),
        };

        let lines = render(system_metrics(&[info]).unwrap(), 200);

        assert!(lines[2].starts_with("ConsID△"));
        assert!(!lines[2].contains("DataReg%"));
        assert!(lines[3].contains("12.3"));
        assert!(lines[3].contains("50.0"));
        assert_eq!(lines[4], "Total items: 1");
    }

    #[test]
    fn test_data_region_columns_sit_between_heap_and_storage() {
        let info = |id: &str, regions: &[(&str, Option<f64>)]| SystemMetricsInfo {
            consistent_id: id.into(),
            host_names: String::new(),
            cpu_load_percent: None,
            load_average: None,
            gc_cpu_load_percent: None,
            heap_usage_percent: Some(10.0),
            data_region_usage_percent: regions
                .iter()
                .map(|(name, usage)| (name.to_string(), *usage))
                .collect(),
            data_storage_gb: Some(2.0),
        };
        let metrics = [
            info("node-1", &[("persistence", Some(75.0)), ("default", Some(12.5))]),
            info("node-2", &[("default", None)]),
        ];

        let lines = render(system_metrics(&metrics).unwrap(), 200);

        let header = &lines[2];
        let heap = header.find("Heap%").unwrap();
        let default = header.find("DataReg%:default").unwrap();
        let persistence = header.find("DataReg%:persistence").unwrap();
        let storage = header.find("DStorageGB").unwrap();
        assert!(heap < default && default < persistence && persistence < storage);

        assert!(lines[3].contains("12.5"));
        assert!(lines[3].contains("75.0"));
        assert!(lines[4].starts_with("node-2"));
        assert!(!lines[4].contains("75.0"));
        assert_eq!(lines[5], "Total items: 2");
    }

    #[test]
    fn test_help_lists_bindings() {
        let lines = render(help(), 80);

        assert!(lines.iter().any(|line| line.contains("Sort by column N")));
        assert_eq!(lines.last().map(String::as_str), Some("Press any key to return"));
    }

    #[test]
    fn test_status_shows_error() {
        let mut app = App::new(Screen::SystemMetrics);
        app.refresh_failed("boom");

        let lines = render(vec![status(&app)], 200);

        assert_eq!(lines[0], "[System metrics] Refreshed: never  Error: boom");
    }

    #[test]
    fn test_uptime_cell_formatting() {
        assert_eq!(
            CellValue::from(Some(Duration::from_secs(59))).display(),
            "0d 0h 0m 59s"
        );
    }
}
