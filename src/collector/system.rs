//! Host metrics under `system.*`.

use super::{MetricDef, ValueKind};

pub static METRICS: &[MetricDef] = &[
    MetricDef {
        name: "system_cpu_cores",
        help: "system.cpu.cores",
        label: None,
        kind: ValueKind::Gauge,
        value: |s| s.system.cpu.cores,
    },
    MetricDef {
        name: "system_load",
        help: "system.load",
        label: Some(("period", "1")),
        kind: ValueKind::Gauge,
        value: |s| s.system.load.one,
    },
    MetricDef {
        name: "system_load",
        help: "system.load",
        label: Some(("period", "5")),
        kind: ValueKind::Gauge,
        value: |s| s.system.load.five,
    },
    MetricDef {
        name: "system_load",
        help: "system.load",
        label: Some(("period", "15")),
        kind: ValueKind::Gauge,
        value: |s| s.system.load.fifteen,
    },
    MetricDef {
        name: "system_load_norm",
        help: "system.load.norm",
        label: Some(("period", "1")),
        kind: ValueKind::Gauge,
        value: |s| s.system.load.norm.one,
    },
    MetricDef {
        name: "system_load_norm",
        help: "system.load.norm",
        label: Some(("period", "5")),
        kind: ValueKind::Gauge,
        value: |s| s.system.load.norm.five,
    },
    MetricDef {
        name: "system_load_norm",
        help: "system.load.norm",
        label: Some(("period", "15")),
        kind: ValueKind::Gauge,
        value: |s| s.system.load.norm.fifteen,
    },
];
