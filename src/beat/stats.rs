//! JSON models for the beat HTTP endpoint.
//!
//! Every numeric field defaults to zero when absent so that a payload from
//! any beat kind or version decodes into the same fixed-shape record.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode a beat JSON document. `null` members are treated as absent, so
/// they decode to their zero default instead of failing the document.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> serde_json::Result<T> {
    let mut value: Value = serde_json::from_slice(body)?;
    if value.is_null() {
        value = Value::Object(serde_json::Map::new());
    }
    strip_nulls(&mut value);
    serde_json::from_value(value)
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

/// Identity document served at `GET /`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BeatInfo {
    /// Beat kind, e.g. `filebeat`.
    pub beat: String,
    pub hostname: String,
    pub name: String,
    pub uuid: String,
    pub version: String,
}

/// Document served at `GET /stats`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub beat: BeatStats,
    pub libbeat: LibBeat,
    pub registrar: Registrar,
    pub filebeat: Filebeat,
    pub metricbeat: Metricbeat,
    pub auditd: Auditd,
    pub system: System,
}

// --- beat ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BeatStats {
    pub cpu: Cpu,
    pub info: BeatRuntimeInfo,
    pub handles: Handles,
    pub memstats: Memstats,
    pub runtime: Runtime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Cpu {
    pub system: CpuTimings,
    pub user: CpuTimings,
    pub total: CpuTimings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CpuTimings {
    pub ticks: f64,
    pub time: Millis,
}

/// A duration the beat reports in integer milliseconds.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Millis {
    pub ms: f64,
}

impl Millis {
    /// Fractional seconds.
    pub fn seconds(self) -> f64 {
        self.ms / 1000.0
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BeatRuntimeInfo {
    pub uptime: Millis,
    pub ephemeral_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Handles {
    pub limit: HandleLimits,
    pub open: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HandleLimits {
    pub hard: f64,
    pub soft: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Memstats {
    pub gc_next: f64,
    pub memory_alloc: f64,
    pub memory_total: f64,
    pub rss: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Runtime {
    pub goroutines: f64,
}

// --- libbeat ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LibBeat {
    pub config: LibBeatConfig,
    pub output: Output,
    pub outputs: Outputs,
    pub pipeline: Pipeline,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LibBeatConfig {
    pub module: ConfigModule,
    pub reloads: f64,
    pub scans: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigModule {
    pub running: f64,
    pub starts: f64,
    pub stops: f64,
}

/// Event counters shared by the output and the publisher pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Events {
    pub acked: f64,
    pub active: f64,
    pub batches: f64,
    pub dropped: f64,
    pub duplicates: f64,
    pub failed: f64,
    pub toomany: f64,
    pub filtered: f64,
    pub published: f64,
    pub retry: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BytesErrors {
    pub bytes: f64,
    pub errors: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Output {
    pub events: Events,
    pub read: BytesErrors,
    pub write: BytesErrors,
    /// Configured output transport, e.g. `elasticsearch` or `kafka`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl Output {
    pub fn is_kafka(&self) -> bool {
        self.kind == "kafka"
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Outputs {
    pub kafka: KafkaOutput,
}

/// Kafka reports its byte counters outside `libbeat.output`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KafkaOutput {
    pub bytes_read: f64,
    pub bytes_write: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Pipeline {
    pub clients: f64,
    pub events: Events,
    pub queue: Queue,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Queue {
    pub acked: f64,
    pub max_events: f64,
}

// --- registrar ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Registrar {
    pub writes: RegistrarWrites,
    pub states: RegistrarStates,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrarWrites {
    pub fail: f64,
    pub success: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrarStates {
    pub cleanup: f64,
    pub current: f64,
    pub update: f64,
}

// --- filebeat ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Filebeat {
    pub events: FilebeatEvents,
    pub harvester: Harvester,
    pub input: Input,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilebeatEvents {
    pub active: f64,
    pub added: f64,
    pub done: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Harvester {
    pub closed: f64,
    pub open_files: f64,
    pub running: f64,
    pub skipped: f64,
    pub started: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Input {
    pub log: LogInput,
    pub netflow: Netflow,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogInput {
    pub files: LogFiles,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogFiles {
    pub renamed: f64,
    pub truncated: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Netflow {
    pub flows: f64,
    pub packets: NetflowPackets,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NetflowPackets {
    pub dropped: f64,
    pub received: f64,
}

// --- metricbeat ---

/// Per-module, per-metricset fetch counters keyed as
/// `metricbeat.<module>.<metricset>`.
#[derive(Debug, Clone, Default)]
pub struct Metricbeat {
    pub modules: BTreeMap<String, BTreeMap<String, MetricsetEvents>>,
}

impl<'de> Deserialize<'de> for Metricbeat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Entries that are not metricset counter objects are skipped rather
        // than failing the whole document.
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;

        let modules = raw
            .into_iter()
            .filter_map(|(module, value)| {
                let sets = serde_json::from_value::<BTreeMap<String, serde_json::Value>>(value)
                    .ok()?
                    .into_iter()
                    .filter_map(|(metricset, v)| {
                        serde_json::from_value::<MetricsetEvents>(v)
                            .ok()
                            .map(|events| (metricset, events))
                    })
                    .collect::<BTreeMap<_, _>>();
                (!sets.is_empty()).then_some((module, sets))
            })
            .collect();

        Ok(Self { modules })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsetEvents {
    pub events: f64,
    pub success: f64,
    pub failures: f64,
}

// --- auditd ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Auditd {
    pub received_msgs: f64,
    pub kernel_lost: f64,
    pub userspace_lost: f64,
    pub reassembler_seq_gaps: f64,
}

// --- system ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct System {
    pub cpu: SystemCpu,
    pub load: Load,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SystemCpu {
    pub cores: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Load {
    #[serde(rename = "1")]
    pub one: f64,
    #[serde(rename = "5")]
    pub five: f64,
    #[serde(rename = "15")]
    pub fifteen: f64,
    pub norm: LoadNorm,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoadNorm {
    #[serde(rename = "1")]
    pub one: f64,
    #[serde(rename = "5")]
    pub five: f64,
    #[serde(rename = "15")]
    pub fifteen: f64,
}
