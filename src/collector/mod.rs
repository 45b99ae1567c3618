//! Translation of beat stats documents into metric families.
//!
//! Each subsystem declares a static metric descriptor table (MDT): one row
//! per exported series, tying a number in [`Stats`] to a metric name, help
//! text, optional variant label and value kind. Rows that share a metric
//! name are grouped into one family whose variant label is a variable label,
//! so the registry never sees two descriptors with the same name.

pub mod auditd;
pub mod beat;
pub mod filebeat;
pub mod libbeat;
pub mod metricbeat;
pub mod registrar;
pub mod system;
pub mod target;

use std::collections::HashMap;

use anyhow::{bail, Result};
use prometheus::core::Desc;
use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType, Untyped};

use crate::beat::Stats;

pub use target::TargetCollector;

/// Constant label carried by every per-target series.
pub const COLLECTOR_LABEL: &str = "collector";

/// Exported value kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Monotonically non-decreasing between upstream restarts.
    Counter,
    /// Current-state quantity.
    Gauge,
    /// Monotonicity not asserted.
    Untyped,
}

impl ValueKind {
    fn metric_type(self) -> MetricType {
        match self {
            Self::Counter => MetricType::COUNTER,
            Self::Gauge => MetricType::GAUGE,
            Self::Untyped => MetricType::UNTYPED,
        }
    }
}

/// One row of a metric descriptor table.
#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    /// Metric name below the beat prefix, e.g. `cpu_time_seconds_total`.
    pub name: &'static str,
    pub help: &'static str,
    /// Label distinguishing rows that share `name`.
    pub label: Option<(&'static str, &'static str)>,
    pub kind: ValueKind,
    pub value: fn(&Stats) -> f64,
}

/// Logical group of beat metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Beat,
    LibBeat,
    Auditd,
    System,
    Filebeat,
    Registrar,
    Metricbeat,
}

impl Subsystem {
    /// Subsystems exported for a beat kind, in emission order.
    pub fn for_beat(kind: &str) -> Vec<Self> {
        let mut subsystems = vec![Self::Beat, Self::LibBeat, Self::Auditd, Self::System];

        match kind {
            "filebeat" => subsystems.extend([Self::Filebeat, Self::Registrar]),
            "metricbeat" => subsystems.push(Self::Metricbeat),
            _ => {}
        }

        subsystems
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beat => "beat",
            Self::LibBeat => "libbeat",
            Self::Auditd => "auditd",
            Self::System => "system",
            Self::Filebeat => "filebeat",
            Self::Registrar => "registrar",
            Self::Metricbeat => "metricbeat",
        }
    }

    /// The static descriptor table of this subsystem.
    pub fn table(self) -> &'static [MetricDef] {
        match self {
            Self::Beat => beat::METRICS,
            Self::LibBeat => libbeat::METRICS,
            Self::Auditd => auditd::METRICS,
            Self::System => system::METRICS,
            Self::Filebeat => filebeat::METRICS,
            Self::Registrar => registrar::METRICS,
            Self::Metricbeat => &[],
        }
    }

    /// Declare every family this subsystem may emit.
    pub fn describe(self, sink: &mut DescSink<'_>) -> Result<()> {
        sink.describe_table(self.table())?;

        match self {
            Self::LibBeat => libbeat::describe_output_type(sink),
            Self::Metricbeat => metricbeat::describe(sink),
            _ => Ok(()),
        }
    }

    /// Emit one sample per descriptor, in table order.
    pub fn collect(self, stats: &Stats, sink: &mut MetricSink<'_>) {
        sink.emit_table(self.table(), stats);

        match self {
            Self::LibBeat => libbeat::collect_output_type(stats, sink),
            Self::Metricbeat => metricbeat::collect(stats, sink),
            _ => {}
        }
    }
}

/// Metric name prefix for a beat kind. Characters that are not valid in a
/// metric name are replaced with `_`.
pub fn metric_prefix(beat: &str) -> String {
    let mut prefix: String = beat
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if prefix.is_empty() || prefix.starts_with(|c: char| c.is_ascii_digit()) {
        prefix.insert(0, '_');
    }

    prefix
}

// --- Descriptor sink ---

/// Collects one [`Desc`] per metric family for registry registration.
pub struct DescSink<'a> {
    prefix: &'a str,
    collector: &'a str,
    descs: Vec<Desc>,
    labels_by_name: HashMap<String, Vec<String>>,
}

impl<'a> DescSink<'a> {
    pub fn new(prefix: &'a str, collector: &'a str) -> Self {
        Self {
            prefix,
            collector,
            descs: Vec::new(),
            labels_by_name: HashMap::new(),
        }
    }

    /// Declare `<prefix>_<name>` with the given variable labels and the
    /// `collector` constant label.
    pub fn describe(&mut self, name: &str, help: &str, variable_labels: &[&str]) -> Result<()> {
        let fq_name = format!("{}_{}", self.prefix, name);
        let const_labels = HashMap::from([(COLLECTOR_LABEL.to_string(), self.collector.to_string())]);
        self.describe_fq(fq_name, help, variable_labels, const_labels)
    }

    /// Declare a family by its fully-qualified name. Repeated declarations of
    /// the same name are folded into one descriptor as long as they agree on
    /// the variable label names.
    pub fn describe_fq(
        &mut self,
        fq_name: String,
        help: &str,
        variable_labels: &[&str],
        const_labels: HashMap<String, String>,
    ) -> Result<()> {
        let labels: Vec<String> = variable_labels.iter().map(|l| l.to_string()).collect();

        if let Some(existing) = self.labels_by_name.get(&fq_name) {
            if *existing != labels {
                bail!(
                    "metric {fq_name} declared with labels {labels:?} and {existing:?}"
                );
            }
            return Ok(());
        }

        let desc = Desc::new(fq_name.clone(), help.to_string(), labels.clone(), const_labels)?;
        self.labels_by_name.insert(fq_name, labels);
        self.descs.push(desc);

        Ok(())
    }

    /// Declare every family of a descriptor table.
    pub fn describe_table(&mut self, table: &[MetricDef]) -> Result<()> {
        for def in table {
            match def.label {
                Some((key, _)) => self.describe(def.name, def.help, &[key])?,
                None => self.describe(def.name, def.help, &[])?,
            }
        }
        Ok(())
    }

    pub fn into_descs(self) -> Vec<Desc> {
        self.descs
    }
}

// --- Metric sink ---

/// Accumulates samples into metric families, preserving first-seen family
/// order and per-family emission order.
pub struct MetricSink<'a> {
    prefix: &'a str,
    collector: &'a str,
    families: Vec<MetricFamily>,
    index: HashMap<String, usize>,
}

impl<'a> MetricSink<'a> {
    pub fn new(prefix: &'a str, collector: &'a str) -> Self {
        Self {
            prefix,
            collector,
            families: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Emit a sample of `<prefix>_<name>`.
    pub fn emit(
        &mut self,
        name: &str,
        help: &str,
        kind: ValueKind,
        labels: &[(&str, &str)],
        value: f64,
    ) {
        let fq_name = format!("{}_{}", self.prefix, name);
        self.emit_fq(&fq_name, help, kind, labels, value);
    }

    /// Emit a sample of a fully-qualified family. The `collector` label is
    /// added to `labels`.
    pub fn emit_fq(
        &mut self,
        fq_name: &str,
        help: &str,
        kind: ValueKind,
        labels: &[(&str, &str)],
        value: f64,
    ) {
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(labels.len() + 1);
        pairs.extend_from_slice(labels);
        pairs.push((COLLECTOR_LABEL, self.collector));
        pairs.sort_by(|a, b| a.0.cmp(b.0));

        let mut metric = Metric::default();
        for (name, value) in pairs {
            let mut pair = LabelPair::default();
            pair.set_name(name.to_string());
            pair.set_value(value.to_string());
            metric.mut_label().push(pair);
        }

        match kind {
            ValueKind::Counter => {
                let mut counter = Counter::default();
                counter.set_value(value);
                metric.set_counter(counter);
            }
            ValueKind::Gauge => {
                let mut gauge = Gauge::default();
                gauge.set_value(value);
                metric.set_gauge(gauge);
            }
            ValueKind::Untyped => {
                let mut untyped = Untyped::default();
                untyped.set_value(value);
                metric.set_untyped(untyped);
            }
        }

        let idx = match self.index.get(fq_name) {
            Some(&idx) => idx,
            None => {
                let mut family = MetricFamily::default();
                family.set_name(fq_name.to_string());
                family.set_help(help.to_string());
                family.set_field_type(kind.metric_type());
                self.families.push(family);
                self.index.insert(fq_name.to_string(), self.families.len() - 1);
                self.families.len() - 1
            }
        };

        if let Some(family) = self.families.get_mut(idx) {
            family.mut_metric().push(metric);
        }
    }

    /// Evaluate every row of a descriptor table against `stats`.
    pub fn emit_table(&mut self, table: &[MetricDef], stats: &Stats) {
        for def in table {
            let value = (def.value)(stats);
            match def.label {
                Some(label) => self.emit(def.name, def.help, def.kind, &[label], value),
                None => self.emit(def.name, def.help, def.kind, &[], value),
            }
        }
    }

    pub fn finish(self) -> Vec<MetricFamily> {
        self.families
    }
}
