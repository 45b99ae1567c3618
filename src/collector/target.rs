use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use tracing::{debug, error};

use super::{metric_prefix, DescSink, MetricSink, Subsystem, ValueKind, COLLECTOR_LABEL};
use crate::beat::{BeatClient, BeatInfo, FetchError, Stats};
use crate::version;

const UP_NAME: &str = "up";
const UP_HELP: &str = "Target up";
const TARGET_INFO_HELP: &str = "target information";

/// Name of the per-target identity metric.
pub fn target_info_name() -> String {
    format!("{}_target_info", version::NAME)
}

/// Registry collector for one validated beat.
///
/// The registry's `collect` is synchronous, so fetching happens in
/// [`TargetCollector::scrape`] ahead of each gather and `collect` renders the
/// outcome of the most recent fetch. Cloning shares the same state.
#[derive(Clone)]
pub struct TargetCollector {
    inner: Arc<Inner>,
}

struct Inner {
    client: BeatClient,
    info: BeatInfo,
    prefix: String,
    subsystems: Vec<Subsystem>,
    descs: Vec<Desc>,
    /// Last decoded `/stats` document. `None` marks the target down.
    stats: Mutex<Option<Stats>>,
}

impl TargetCollector {
    /// Build the collector for a beat whose identity has been fetched.
    pub fn new(client: BeatClient, info: BeatInfo) -> Result<Self> {
        let prefix = metric_prefix(&info.beat);
        let subsystems = Subsystem::for_beat(&info.beat);
        let label = client.target().label.clone();

        let descs = describe(&prefix, &label, &info, &subsystems)
            .with_context(|| format!("describing metrics for collector {label}"))?;

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                info,
                prefix,
                subsystems,
                descs,
                stats: Mutex::new(None),
            }),
        })
    }

    /// Value of the `collector` label.
    pub fn label(&self) -> &str {
        &self.inner.client.target().label
    }

    pub fn info(&self) -> &BeatInfo {
        &self.inner.info
    }

    pub fn subsystems(&self) -> &[Subsystem] {
        &self.inner.subsystems
    }

    /// Fetch `/stats` and keep the result for the next `collect`. Returns
    /// whether the target is up.
    pub async fn scrape(&self) -> bool {
        let result = self.inner.client.fetch_stats().await;
        self.record(result)
    }

    fn record(&self, result: Result<Stats, FetchError>) -> bool {
        match result {
            Ok(stats) => {
                debug!(collector = %self.label(), "scraped beat stats");
                *self.inner.stats.lock() = Some(stats);
                true
            }
            Err(e) => {
                error!(
                    collector = %self.label(),
                    error = %e,
                    "failed getting /stats endpoint of target"
                );
                *self.inner.stats.lock() = None;
                false
            }
        }
    }

    fn families(&self) -> Vec<MetricFamily> {
        let inner = &self.inner;
        let mut sink = MetricSink::new(&inner.prefix, self.label());
        let stats = inner.stats.lock();

        let Some(stats) = stats.as_ref() else {
            sink.emit(UP_NAME, UP_HELP, ValueKind::Gauge, &[], 0.0);
            return sink.finish();
        };

        sink.emit_fq(
            &target_info_name(),
            TARGET_INFO_HELP,
            ValueKind::Gauge,
            &[
                ("beat", inner.info.beat.as_str()),
                ("version", inner.info.version.as_str()),
            ],
            1.0,
        );
        sink.emit(UP_NAME, UP_HELP, ValueKind::Gauge, &[], 1.0);

        for subsystem in &inner.subsystems {
            subsystem.collect(stats, &mut sink);
        }

        sink.finish()
    }
}

impl Collector for TargetCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.inner.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.families()
    }
}

fn describe(
    prefix: &str,
    label: &str,
    info: &BeatInfo,
    subsystems: &[Subsystem],
) -> Result<Vec<Desc>> {
    let mut sink = DescSink::new(prefix, label);

    sink.describe_fq(
        target_info_name(),
        TARGET_INFO_HELP,
        &[],
        HashMap::from([
            ("beat".to_string(), info.beat.clone()),
            ("version".to_string(), info.version.clone()),
            (COLLECTOR_LABEL.to_string(), label.to_string()),
        ]),
    )?;
    sink.describe(UP_NAME, UP_HELP, &[])?;

    for subsystem in subsystems {
        subsystem.describe(&mut sink)?;
    }

    Ok(sink.into_descs())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::testutil::sample;
    use super::*;
    use crate::beat::Target;

    fn collector(beat: &str, uri: &str) -> TargetCollector {
        let target: Target = uri.parse().expect("valid target");
        let client = BeatClient::new(target, Duration::from_secs(1)).expect("client");
        let info = BeatInfo {
            beat: beat.to_string(),
            version: "7.17.0".to_string(),
            ..Default::default()
        };
        TargetCollector::new(client, info).expect("collector")
    }

    fn names(families: &[MetricFamily]) -> Vec<&str> {
        families.iter().map(|f| f.get_name()).collect()
    }

    #[test]
    fn test_down_emits_only_up_zero() {
        let c = collector("filebeat", "http://localhost:5066;svc");
        c.record(Err(FetchError::Status {
            url: "http://localhost:5066/stats".to_string(),
            status: 500,
        }));

        let families = c.collect();
        assert_eq!(names(&families), vec!["filebeat_up"]);
        assert_eq!(sample(&families, "filebeat_up", &[("collector", "svc")]), Some(0.0));
    }

    #[test]
    fn test_never_scraped_is_down() {
        let c = collector("filebeat", "http://localhost:5066");
        assert_eq!(names(&c.collect()), vec!["filebeat_up"]);
    }

    #[test]
    fn test_up_emits_identity_then_subsystems() {
        let c = collector("filebeat", "http://localhost:5066;svc");
        assert!(c.record(Ok(Stats::default())));

        let families = c.collect();
        let names = names(&families);
        assert_eq!(names[0], "beat_exporter_target_info");
        assert_eq!(names[1], "filebeat_up");
        assert!(names.contains(&"filebeat_registrar_states"));
        assert!(names.contains(&"filebeat_filebeat_harvester"));
        assert!(!names.contains(&"filebeat_metricbeat_metricset"));

        assert_eq!(
            sample(
                &families,
                "beat_exporter_target_info",
                &[("beat", "filebeat"), ("version", "7.17.0"), ("collector", "svc")]
            ),
            Some(1.0)
        );
        assert_eq!(sample(&families, "filebeat_up", &[]), Some(1.0));
    }

    #[test]
    fn test_subsystems_follow_beat_kind() {
        let fb = collector("filebeat", "http://localhost:5066");
        assert!(fb.subsystems().contains(&Subsystem::Filebeat));
        assert!(fb.subsystems().contains(&Subsystem::Registrar));

        let mb = collector("metricbeat", "http://localhost:5066");
        assert!(mb.subsystems().contains(&Subsystem::Metricbeat));
        assert!(!mb.subsystems().contains(&Subsystem::Filebeat));
    }

    #[test]
    fn test_other_kinds_skip_filebeat_subsystems() {
        let c = collector("heartbeat", "http://localhost:5066");
        c.record(Ok(Stats::default()));

        let families = c.collect();
        let names = names(&families);
        assert!(names.contains(&"heartbeat_libbeat_output_total"));
        assert!(names.contains(&"heartbeat_auditd_received_msgs_total"));
        assert!(!names.iter().any(|n| n.starts_with("heartbeat_registrar")));
        assert!(!names.iter().any(|n| n.starts_with("heartbeat_filebeat")));
    }

    #[test]
    fn test_every_series_carries_collector_label() {
        let c = collector("metricbeat", "http://10.0.0.1:5067;mb");
        let stats: Stats = serde_json::from_str(
            r#"{"metricbeat": {"system": {"cpu": {"events": 1}}}}"#,
        )
        .expect("decode stats");
        c.record(Ok(stats));

        for family in c.collect() {
            for metric in family.get_metric() {
                assert!(
                    metric
                        .get_label()
                        .iter()
                        .any(|p| p.get_name() == "collector" && p.get_value() == "mb"),
                    "{} lacks collector label",
                    family.get_name()
                );
            }
        }
    }

    #[test]
    fn test_failure_after_success_drops_stale_series() {
        let c = collector("filebeat", "http://localhost:5066");
        c.record(Ok(Stats::default()));
        assert!(c.collect().len() > 2);

        c.record(Err(FetchError::MissingBeatKind {
            url: "http://localhost:5066/".to_string(),
        }));
        assert_eq!(names(&c.collect()), vec!["filebeat_up"]);
    }

    #[test]
    fn test_descs_are_unique_per_family() {
        let c = collector("filebeat", "http://localhost:5066");
        let descs = c.desc();
        let mut names: Vec<&str> = descs.iter().map(|d| d.fq_name.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_collected_families_are_described() {
        let c = collector("metricbeat", "http://localhost:5066");
        let stats: Stats = serde_json::from_str(
            r#"{"metricbeat": {"docker": {"container": {"events": 2}}}}"#,
        )
        .expect("decode stats");
        c.record(Ok(stats));

        let described: Vec<String> = c.desc().iter().map(|d| d.fq_name.clone()).collect();
        for family in c.collect() {
            assert!(
                described.iter().any(|n| n == family.get_name()),
                "{} is not described",
                family.get_name()
            );
        }
    }
}
