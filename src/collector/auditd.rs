//! Audit framework counters under `auditd.*`.

use super::{MetricDef, ValueKind};

pub static METRICS: &[MetricDef] = &[
    MetricDef {
        name: "auditd_received_msgs_total",
        help: "auditd.received_msgs",
        label: None,
        kind: ValueKind::Counter,
        value: |s| s.auditd.received_msgs,
    },
    MetricDef {
        name: "auditd_lost_msgs_total",
        help: "auditd.lost",
        label: Some(("source", "kernel")),
        kind: ValueKind::Counter,
        value: |s| s.auditd.kernel_lost,
    },
    MetricDef {
        name: "auditd_lost_msgs_total",
        help: "auditd.lost",
        label: Some(("source", "userspace")),
        kind: ValueKind::Counter,
        value: |s| s.auditd.userspace_lost,
    },
    MetricDef {
        name: "auditd_reassembler_seq_gaps_total",
        help: "auditd.reassembler_seq_gaps",
        label: None,
        kind: ValueKind::Counter,
        value: |s| s.auditd.reassembler_seq_gaps,
    },
];
