//! Shared publisher library metrics under `libbeat.*`.

use anyhow::Result;

use super::{DescSink, MetricDef, MetricSink, ValueKind};
use crate::beat::Stats;

const OUTPUT_TYPE_NAME: &str = "libbeat_output_total";
const OUTPUT_TYPE_HELP: &str = "libbeat.output.type";
const OUTPUT_TYPE_LABEL: &str = "type";

pub static METRICS: &[MetricDef] = &[
    MetricDef {
        name: "libbeat_config_reloads_total",
        help: "libbeat.config.reloads",
        label: None,
        kind: ValueKind::Counter,
        value: |s| s.libbeat.config.reloads,
    },
    MetricDef {
        name: "libbeat_config_scans_total",
        help: "libbeat.config.scans",
        label: None,
        kind: ValueKind::Counter,
        value: |s| s.libbeat.config.scans,
    },
    MetricDef {
        name: "libbeat_config",
        help: "libbeat.config.module",
        label: Some(("module", "running")),
        kind: ValueKind::Gauge,
        value: |s| s.libbeat.config.module.running,
    },
    MetricDef {
        name: "libbeat_config",
        help: "libbeat.config.module",
        label: Some(("module", "starts")),
        kind: ValueKind::Gauge,
        value: |s| s.libbeat.config.module.starts,
    },
    MetricDef {
        name: "libbeat_config",
        help: "libbeat.config.module",
        label: Some(("module", "stops")),
        kind: ValueKind::Gauge,
        value: |s| s.libbeat.config.module.stops,
    },
    MetricDef {
        name: "libbeat_output_read_bytes_total",
        help: "libbeat.output.read.bytes",
        label: None,
        kind: ValueKind::Counter,
        value: |s| {
            if s.libbeat.output.is_kafka() {
                s.libbeat.outputs.kafka.bytes_read
            } else {
                s.libbeat.output.read.bytes
            }
        },
    },
    MetricDef {
        name: "libbeat_output_read_errors_total",
        help: "libbeat.output.read.errors",
        label: None,
        kind: ValueKind::Counter,
        value: |s| s.libbeat.output.read.errors,
    },
    MetricDef {
        name: "libbeat_output_write_bytes_total",
        help: "libbeat.output.write.bytes",
        label: None,
        kind: ValueKind::Counter,
        value: |s| {
            if s.libbeat.output.is_kafka() {
                s.libbeat.outputs.kafka.bytes_write
            } else {
                s.libbeat.output.write.bytes
            }
        },
    },
    MetricDef {
        name: "libbeat_output_write_errors_total",
        help: "libbeat.output.write.errors",
        label: None,
        kind: ValueKind::Counter,
        value: |s| s.libbeat.output.write.errors,
    },
    MetricDef {
        name: "libbeat_output_events",
        help: "libbeat.output.events",
        label: Some(("type", "acked")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.output.events.acked,
    },
    MetricDef {
        name: "libbeat_output_events",
        help: "libbeat.output.events",
        label: Some(("type", "active")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.output.events.active,
    },
    MetricDef {
        name: "libbeat_output_events",
        help: "libbeat.output.events",
        label: Some(("type", "batches")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.output.events.batches,
    },
    MetricDef {
        name: "libbeat_output_events",
        help: "libbeat.output.events",
        label: Some(("type", "dropped")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.output.events.dropped,
    },
    MetricDef {
        name: "libbeat_output_events",
        help: "libbeat.output.events",
        label: Some(("type", "duplicates")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.output.events.duplicates,
    },
    MetricDef {
        name: "libbeat_output_events",
        help: "libbeat.output.events",
        label: Some(("type", "failed")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.output.events.failed,
    },
    MetricDef {
        name: "libbeat_output_events",
        help: "libbeat.output.events",
        label: Some(("type", "toomany")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.output.events.toomany,
    },
    MetricDef {
        name: "libbeat_pipeline_clients",
        help: "libbeat.pipeline.clients",
        label: None,
        kind: ValueKind::Gauge,
        value: |s| s.libbeat.pipeline.clients,
    },
    MetricDef {
        name: "libbeat_pipeline_queue",
        help: "libbeat.pipeline.queue",
        label: Some(("type", "acked")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.pipeline.queue.acked,
    },
    MetricDef {
        name: "libbeat_pipeline_max_events",
        help: "libbeat.pipeline.queue",
        label: Some(("type", "max_events")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.pipeline.queue.max_events,
    },
    MetricDef {
        name: "libbeat_pipeline_events",
        help: "libbeat.pipeline.events",
        label: Some(("type", "active")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.pipeline.events.active,
    },
    MetricDef {
        name: "libbeat_pipeline_events",
        help: "libbeat.pipeline.events",
        label: Some(("type", "dropped")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.pipeline.events.dropped,
    },
    MetricDef {
        name: "libbeat_pipeline_events",
        help: "libbeat.pipeline.events",
        label: Some(("type", "failed")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.pipeline.events.failed,
    },
    MetricDef {
        name: "libbeat_pipeline_events",
        help: "libbeat.pipeline.events",
        label: Some(("type", "filtered")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.pipeline.events.filtered,
    },
    MetricDef {
        name: "libbeat_pipeline_events",
        help: "libbeat.pipeline.events",
        label: Some(("type", "published")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.pipeline.events.published,
    },
    MetricDef {
        name: "libbeat_pipeline_events",
        help: "libbeat.pipeline.events",
        label: Some(("type", "retry")),
        kind: ValueKind::Untyped,
        value: |s| s.libbeat.pipeline.events.retry,
    },
];

/// Declare the output transport identity metric.
pub fn describe_output_type(sink: &mut DescSink<'_>) -> Result<()> {
    sink.describe(OUTPUT_TYPE_NAME, OUTPUT_TYPE_HELP, &[OUTPUT_TYPE_LABEL])
}

/// Emit `libbeat_output_total{type=<output type>} 1`.
pub fn collect_output_type(stats: &Stats, sink: &mut MetricSink<'_>) {
    sink.emit(
        OUTPUT_TYPE_NAME,
        OUTPUT_TYPE_HELP,
        ValueKind::Counter,
        &[(OUTPUT_TYPE_LABEL, stats.libbeat.output.kind.as_str())],
        1.0,
    );
}

#[cfg(test)]
mod tests {
    use super::super::testutil::sample;
    use super::super::Subsystem;
    use super::*;

    fn collect(json: &str) -> Vec<prometheus::proto::MetricFamily> {
        let stats: Stats = serde_json::from_str(json).expect("decode stats");
        let mut sink = MetricSink::new("filebeat", "c");
        Subsystem::LibBeat.collect(&stats, &mut sink);
        sink.finish()
    }

    #[test]
    fn test_kafka_bytes_come_from_outputs_subtree() {
        let families = collect(
            r#"{"libbeat": {
                "output": {"type": "kafka", "read": {"bytes": 1, "errors": 2}, "write": {"bytes": 3}},
                "outputs": {"kafka": {"bytes_read": 42, "bytes_write": 43}}
            }}"#,
        );

        assert_eq!(sample(&families, "filebeat_libbeat_output_read_bytes_total", &[]), Some(42.0));
        assert_eq!(sample(&families, "filebeat_libbeat_output_write_bytes_total", &[]), Some(43.0));
        assert_eq!(sample(&families, "filebeat_libbeat_output_read_errors_total", &[]), Some(2.0));
        assert_eq!(
            sample(&families, "filebeat_libbeat_output_total", &[("type", "kafka")]),
            Some(1.0)
        );
    }

    #[test]
    fn test_other_outputs_use_output_bytes() {
        let families = collect(
            r#"{"libbeat": {
                "output": {"type": "elasticsearch", "read": {"bytes": 1}, "write": {"bytes": 3}},
                "outputs": {"kafka": {"bytes_read": 42, "bytes_write": 43}}
            }}"#,
        );

        assert_eq!(sample(&families, "filebeat_libbeat_output_read_bytes_total", &[]), Some(1.0));
        assert_eq!(sample(&families, "filebeat_libbeat_output_write_bytes_total", &[]), Some(3.0));
        assert_eq!(
            sample(&families, "filebeat_libbeat_output_total", &[("type", "elasticsearch")]),
            Some(1.0)
        );
    }

    #[test]
    fn test_output_type_emitted_exactly_once() {
        let families = collect(r#"{"libbeat": {"output": {"type": "logstash"}}}"#);

        let family = families
            .iter()
            .find(|f| f.get_name() == "filebeat_libbeat_output_total")
            .expect("output type family");
        assert_eq!(family.get_metric().len(), 1);
    }

    #[test]
    fn test_pipeline_series() {
        let families = collect(
            r#"{"libbeat": {"pipeline": {
                "clients": 4,
                "queue": {"acked": 10, "max_events": 4096},
                "events": {"published": 100, "retry": 2}
            }}}"#,
        );

        assert_eq!(sample(&families, "filebeat_libbeat_pipeline_clients", &[]), Some(4.0));
        assert_eq!(
            sample(&families, "filebeat_libbeat_pipeline_max_events", &[("type", "max_events")]),
            Some(4096.0)
        );
        assert_eq!(
            sample(&families, "filebeat_libbeat_pipeline_events", &[("type", "published")]),
            Some(100.0)
        );
        assert_eq!(
            sample(&families, "filebeat_libbeat_pipeline_events", &[("type", "retry")]),
            Some(2.0)
        );
    }
}
