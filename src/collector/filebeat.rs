//! Filebeat input and harvester metrics under `filebeat.*`.

use super::{MetricDef, ValueKind};

pub static METRICS: &[MetricDef] = &[
    MetricDef {
        name: "filebeat_events",
        help: "filebeat.events",
        label: Some(("event", "active")),
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.events.active,
    },
    MetricDef {
        name: "filebeat_events",
        help: "filebeat.events",
        label: Some(("event", "added")),
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.events.added,
    },
    MetricDef {
        name: "filebeat_events",
        help: "filebeat.events",
        label: Some(("event", "done")),
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.events.done,
    },
    MetricDef {
        name: "filebeat_harvester",
        help: "filebeat.harvester",
        label: Some(("harvester", "closed")),
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.harvester.closed,
    },
    MetricDef {
        name: "filebeat_harvester",
        help: "filebeat.harvester",
        label: Some(("harvester", "open_files")),
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.harvester.open_files,
    },
    MetricDef {
        name: "filebeat_harvester",
        help: "filebeat.harvester",
        label: Some(("harvester", "running")),
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.harvester.running,
    },
    MetricDef {
        name: "filebeat_harvester",
        help: "filebeat.harvester",
        label: Some(("harvester", "skipped")),
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.harvester.skipped,
    },
    MetricDef {
        name: "filebeat_harvester",
        help: "filebeat.harvester",
        label: Some(("harvester", "started")),
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.harvester.started,
    },
    MetricDef {
        name: "filebeat_input_log",
        help: "filebeat.input_log",
        label: Some(("files", "renamed")),
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.input.log.files.renamed,
    },
    MetricDef {
        name: "filebeat_input_log",
        help: "filebeat.input_log",
        label: Some(("files", "truncated")),
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.input.log.files.truncated,
    },
    MetricDef {
        name: "filebeat_input_netflow_flows",
        help: "filebeat.input_netflow",
        label: None,
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.input.netflow.flows,
    },
    MetricDef {
        name: "filebeat_input_netflow",
        help: "filebeat.input_netflow",
        label: Some(("packets", "dropped")),
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.input.netflow.packets.dropped,
    },
    MetricDef {
        name: "filebeat_input_netflow",
        help: "filebeat.input_netflow",
        label: Some(("packets", "received")),
        kind: ValueKind::Untyped,
        value: |s| s.filebeat.input.netflow.packets.received,
    },
];
