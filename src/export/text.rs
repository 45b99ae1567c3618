//! Text exposition encoding.
//!
//! `prometheus::TextEncoder` does not handle untyped families, which the
//! beat collectors emit for their raw counters. Those are written here;
//! every other family goes through the stock encoder.

use std::fmt::Write as _;

use prometheus::proto::{MetricFamily, MetricType};
use prometheus::{Encoder, TextEncoder};
use tracing::error;

/// Encode `families` in the text exposition format. A family that fails to
/// encode is logged and left out.
pub fn encode(families: &[MetricFamily]) -> String {
    let encoder = TextEncoder::new();
    let mut out = String::new();

    for family in families {
        if family.get_field_type() == MetricType::UNTYPED {
            write_untyped(family, &mut out);
            continue;
        }

        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(std::slice::from_ref(family), &mut buffer) {
            error!(metric = family.get_name(), error = %e, "encoding metric family");
            continue;
        }

        match String::from_utf8(buffer) {
            Ok(text) => out.push_str(&text),
            Err(e) => {
                error!(metric = family.get_name(), error = %e, "converting metric family to string");
            }
        }
    }

    out
}

fn write_untyped(family: &MetricFamily, out: &mut String) {
    let name = family.get_name();
    if family.get_metric().is_empty() {
        return;
    }

    let _ = writeln!(out, "# HELP {} {}", name, escape_help(family.get_help()));
    let _ = writeln!(out, "# TYPE {} untyped", name);

    for metric in family.get_metric() {
        out.push_str(name);

        let labels = metric.get_label();
        if !labels.is_empty() {
            out.push('{');
            for (i, pair) in labels.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(
                    out,
                    "{}=\"{}\"",
                    pair.get_name(),
                    escape_label_value(pair.get_value())
                );
            }
            out.push('}');
        }

        out.push(' ');
        out.push_str(&format_value(metric.get_untyped().get_value()));
        if metric.get_timestamp_ms() != 0 {
            let _ = write!(out, " {}", metric.get_timestamp_ms());
        }
        out.push('\n');
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', r"\\").replace('\n', r"\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', r"\\")
        .replace('\n', r"\n")
        .replace('"', "\\\"")
}

fn format_value(value: f64) -> String {
    if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}
