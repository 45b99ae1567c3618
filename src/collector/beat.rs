//! Process-level metrics every beat reports under `beat.*`.

use super::{MetricDef, ValueKind};

pub static METRICS: &[MetricDef] = &[
    MetricDef {
        name: "cpu_time_seconds_total",
        help: "beat.cpu.time",
        label: Some(("mode", "system")),
        kind: ValueKind::Counter,
        value: |s| s.beat.cpu.system.time.seconds(),
    },
    MetricDef {
        name: "cpu_time_seconds_total",
        help: "beat.cpu.time",
        label: Some(("mode", "user")),
        kind: ValueKind::Counter,
        value: |s| s.beat.cpu.user.time.seconds(),
    },
    MetricDef {
        name: "cpu_ticks_total",
        help: "beat.cpu.ticks",
        label: Some(("mode", "system")),
        kind: ValueKind::Counter,
        value: |s| s.beat.cpu.system.ticks,
    },
    MetricDef {
        name: "cpu_ticks_total",
        help: "beat.cpu.ticks",
        label: Some(("mode", "user")),
        kind: ValueKind::Counter,
        value: |s| s.beat.cpu.user.ticks,
    },
    MetricDef {
        name: "handles_limit",
        help: "beat.handles.limit",
        label: Some(("limit", "hard")),
        kind: ValueKind::Counter,
        value: |s| s.beat.handles.limit.hard,
    },
    MetricDef {
        name: "handles_limit",
        help: "beat.handles.limit",
        label: Some(("limit", "soft")),
        kind: ValueKind::Counter,
        value: |s| s.beat.handles.limit.soft,
    },
    MetricDef {
        name: "handles_open",
        help: "beat.handles.open",
        label: None,
        kind: ValueKind::Counter,
        value: |s| s.beat.handles.open,
    },
    MetricDef {
        name: "uptime_seconds_total",
        help: "beat.info.uptime.ms",
        label: None,
        kind: ValueKind::Counter,
        value: |s| s.beat.info.uptime.seconds(),
    },
    MetricDef {
        name: "memstats_gc_next_total",
        help: "beat.memstats.gc_next",
        label: None,
        kind: ValueKind::Counter,
        value: |s| s.beat.memstats.gc_next,
    },
    MetricDef {
        name: "memstats_memory_alloc",
        help: "beat.memstats.memory_alloc",
        label: None,
        kind: ValueKind::Gauge,
        value: |s| s.beat.memstats.memory_alloc,
    },
    MetricDef {
        name: "memstats_memory",
        help: "beat.memstats.memory_total",
        label: None,
        kind: ValueKind::Gauge,
        value: |s| s.beat.memstats.memory_total,
    },
    MetricDef {
        name: "memstats_rss",
        help: "beat.memstats.rss",
        label: None,
        kind: ValueKind::Gauge,
        value: |s| s.beat.memstats.rss,
    },
    MetricDef {
        name: "runtime_goroutines",
        help: "beat.runtime.goroutines",
        label: None,
        kind: ValueKind::Gauge,
        value: |s| s.beat.runtime.goroutines,
    },
];
