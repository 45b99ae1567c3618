//! Per-metricset fetch counters under `metricbeat.<module>.<metricset>`.
//!
//! The set of modules is only known at scrape time, so this subsystem has no
//! static table and emits one series per module, metricset and counter type.

use anyhow::Result;

use super::{DescSink, MetricSink, ValueKind};
use crate::beat::Stats;

const NAME: &str = "metricbeat_metricset";
const HELP: &str = "metricbeat.<module>.<metricset>";
const LABELS: [&str; 3] = ["module", "metricset", "type"];

pub fn describe(sink: &mut DescSink<'_>) -> Result<()> {
    sink.describe(NAME, HELP, &LABELS)
}

pub fn collect(stats: &Stats, sink: &mut MetricSink<'_>) {
    for (module, metricsets) in &stats.metricbeat.modules {
        for (metricset, counters) in metricsets {
            for (kind, value) in [
                ("events", counters.events),
                ("success", counters.success),
                ("failures", counters.failures),
            ] {
                sink.emit(
                    NAME,
                    HELP,
                    ValueKind::Untyped,
                    &[
                        (LABELS[0], module.as_str()),
                        (LABELS[1], metricset.as_str()),
                        (LABELS[2], kind),
                    ],
                    value,
                );
            }
        }
    }
}
