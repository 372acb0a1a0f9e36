//! Human-readable formatting for provider fields.
//!
//! Byte sizes and rates always use binary (IEC) units so that the same
//! quantity renders the same way in every slot.

use std::time::Duration;

use crate::FieldValue;

/// IEC unit suffixes above plain bytes.
const IEC_UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Default number of decimals for scaled byte values.
const DEFAULT_PRECISION: usize = 1;

/// Format a byte count with IEC units (`80B`, `1.5KiB`, `12.0GiB`).
pub fn iec_bytes(bytes: u64) -> String {
    iec_bytes_with_precision(bytes, DEFAULT_PRECISION)
}

/// Format a byte count with IEC units and a fixed number of decimals.
///
/// Values below 1 KiB are always printed as whole bytes.
pub fn iec_bytes_with_precision(bytes: u64, precision: usize) -> String {
    scale_iec(bytes as f64, precision)
}

/// Format a byte rate with IEC units per second (`512B/s`, `1.2MiB/s`).
pub fn iec_rate(bytes_per_sec: f64) -> String {
    iec_rate_with_precision(bytes_per_sec, DEFAULT_PRECISION)
}

/// Format a byte rate with IEC units per second and a fixed number of decimals.
pub fn iec_rate_with_precision(bytes_per_sec: f64, precision: usize) -> String {
    format!("{}/s", scale_iec(bytes_per_sec.max(0.0), precision))
}

fn scale_iec(value: f64, precision: usize) -> String {
    if value < 1024.0 {
        return format!("{}B", value.round() as u64);
    }

    let mut scaled = value / 1024.0;
    let mut unit = 0;
    while scaled >= 1024.0 && unit < IEC_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    format!("{:.*}{}", precision, scaled, IEC_UNITS[unit])
}

/// Format a duration compactly (`2h05m`, `17m`, `42s`).
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 3600 {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// How a placeholder asks for its value to be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatSpec {
    /// The field kind's natural formatting.
    #[default]
    Default,
    /// Integer, left-padded with zeros to the given width (`{pct:03}`).
    ZeroPad(usize),
    /// Fixed number of decimals (`{load1:.2}`).
    Precision(usize),
}

impl FieldValue {
    /// Render this value for display in a segment.
    pub fn render(&self, spec: FormatSpec) -> String {
        match (self, spec) {
            (FieldValue::Int(n), FormatSpec::ZeroPad(w)) => format!("{:0w$}", n, w = w),
            (FieldValue::Int(n), FormatSpec::Precision(p)) => format!("{:.p$}", *n as f64, p = p),
            (FieldValue::Int(n), FormatSpec::Default) => n.to_string(),

            (FieldValue::Float(x), FormatSpec::ZeroPad(w)) => {
                format!("{:0w$}", x.trunc() as i64, w = w)
            }
            (FieldValue::Float(x), FormatSpec::Precision(p)) => format!("{:.p$}", x, p = p),
            (FieldValue::Float(x), FormatSpec::Default) => format!("{:.2}", x),

            (FieldValue::Bytes(b), FormatSpec::Precision(p)) => iec_bytes_with_precision(*b, p),
            (FieldValue::Bytes(b), _) => iec_bytes(*b),

            (FieldValue::Rate(r), FormatSpec::Precision(p)) => iec_rate_with_precision(*r, p),
            (FieldValue::Rate(r), _) => iec_rate(*r),

            (FieldValue::Duration(d), _) => format_duration(*d),
            (FieldValue::Bool(b), _) => b.to_string(),
            (FieldValue::Text(t), _) => t.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_byte_counts_are_whole_bytes() {
        assert_eq!(iec_bytes(0), "0B");
        assert_eq!(iec_bytes(80), "80B");
        assert_eq!(iec_bytes(1023), "1023B");
    }

    #[test]
    fn byte_counts_scale_by_1024() {
        assert_eq!(iec_bytes(1024), "1.0KiB");
        assert_eq!(iec_bytes(1536), "1.5KiB");
        assert_eq!(iec_bytes(5 * 1024 * 1024 * 1024), "5.0GiB");
        assert_eq!(iec_bytes_with_precision(3 * 1024 * 1024 / 2, 2), "1.50MiB");
    }

    #[test]
    fn huge_values_stop_at_largest_unit() {
        assert_eq!(iec_bytes(u64::MAX), "16.0EiB");
    }

    #[test]
    fn rates_use_per_second_suffix() {
        assert_eq!(iec_rate(512.0), "512B/s");
        assert_eq!(iec_rate(2.5 * 1024.0 * 1024.0), "2.5MiB/s");
        assert_eq!(iec_rate(-3.0), "0B/s");
    }

    #[test]
    fn durations_are_compact() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(17 * 60 + 5)), "17m");
        assert_eq!(format_duration(Duration::from_secs(2 * 3600 + 5 * 60)), "2h05m");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn int_zero_padding() {
        assert_eq!(FieldValue::Int(50).render(FormatSpec::ZeroPad(3)), "050");
        assert_eq!(FieldValue::Int(100).render(FormatSpec::ZeroPad(3)), "100");
    }

    #[test]
    fn float_precision() {
        assert_eq!(FieldValue::Float(0.4567).render(FormatSpec::Precision(2)), "0.46");
        assert_eq!(FieldValue::Float(1.0).render(FormatSpec::Default), "1.00");
        assert_eq!(FieldValue::Float(7.9).render(FormatSpec::ZeroPad(2)), "07");
    }

    #[test]
    fn text_and_bool_ignore_spec() {
        assert_eq!(FieldValue::Text("up".into()).render(FormatSpec::ZeroPad(5)), "up");
        assert_eq!(FieldValue::Bool(true).render(FormatSpec::Default), "true");
    }
}
