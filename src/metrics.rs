// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.

use crate::probe::ProbeResult;
use std::fmt;

struct Sample<'a> {
    name: &'static str,
    mount_point: &'a str,
    value: f64,
}

impl fmt::Display for Sample<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {{mountpoint=\"{}\"}} {:.6}",
            self.name,
            escape_label(self.mount_point),
            self.value
        )
    }
}

/// Render one probe cycle in the text exposition format, three series per
/// mount labeled by mount point. A timed-out (inconclusive) probe renders
/// live=0 error=0, distinguishing "unknown, still hanging" from a confirmed
/// failure (live=0 error=1).
pub fn render(results: &[ProbeResult]) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for result in results {
        let mount_point = result.mount.mount_point.as_str();
        let outcome = &result.outcome;
        for sample in [
            Sample {
                name: "vfs_filesystem_error",
                mount_point,
                value: bool_to_f64(outcome.error),
            },
            Sample {
                name: "vfs_filesystem_live",
                mount_point,
                value: bool_to_f64(outcome.is_live()),
            },
            Sample {
                name: "vfs_filesystem_scan_duration_seconds",
                mount_point,
                value: outcome.elapsed_secs(),
            },
        ] {
            let _ = writeln!(out, "{sample}");
        }
    }
    out
}

fn escape_label(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}

fn bool_to_f64(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}
