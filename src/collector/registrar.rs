//! Filebeat registry bookkeeping under `registrar.*`.

use super::{MetricDef, ValueKind};

pub static METRICS: &[MetricDef] = &[
    MetricDef {
        name: "registrar_writes",
        help: "registrar.writes",
        label: Some(("writes", "fail")),
        kind: ValueKind::Gauge,
        value: |s| s.registrar.writes.fail,
    },
    MetricDef {
        name: "registrar_writes",
        help: "registrar.writes",
        label: Some(("writes", "success")),
        kind: ValueKind::Gauge,
        value: |s| s.registrar.writes.success,
    },
    MetricDef {
        name: "registrar_writes",
        help: "registrar.writes",
        label: Some(("writes", "total")),
        kind: ValueKind::Gauge,
        value: |s| s.registrar.writes.total,
    },
    MetricDef {
        name: "registrar_states",
        help: "registrar.states",
        label: Some(("state", "cleanup")),
        kind: ValueKind::Gauge,
        value: |s| s.registrar.states.cleanup,
    },
    MetricDef {
        name: "registrar_states",
        help: "registrar.states",
        label: Some(("state", "current")),
        kind: ValueKind::Gauge,
        value: |s| s.registrar.states.current,
    },
    MetricDef {
        name: "registrar_states",
        help: "registrar.states",
        label: Some(("state", "update")),
        kind: ValueKind::Gauge,
        value: |s| s.registrar.states.update,
    },
];
