//! Batch report and fix output formatting
//!
//! Human-readable lines for operators and JSON for downstream tools.

use std::fmt;

use serde::Serialize;

use crate::api::types::{BatchReport, GroupStatus};
use crate::core::Fix;

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupStatus::Pending { group_id, have, required } => {
                write!(f, "{}: saved {}/{} readings, waiting for more", group_id, have, required)
            }
            GroupStatus::Resolved { group_id, animal_id, latitude, longitude, .. } => {
                write!(f, "{}: fix calculated for {} ({:.5}, {:.5})", group_id, animal_id, latitude, longitude)
            }
            GroupStatus::Failed { group_id, reason } => write!(f, "{}: no fix ({})", group_id, reason),
        }
    }
}

/// Plain-text rendering of batch reports and stored fixes
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    /// One line per group without the summary header
    pub compact: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        Self { compact: true }
    }

    pub fn format_report(&self, report: &BatchReport) -> String {
        let mut output = String::new();
        if !self.compact {
            output.push_str(&format!(
                "Recorded {} observations in {} groups ({} resolved, {} failed, {} pending)\n",
                report.recorded,
                report.groups.len(),
                report.resolved_count(),
                report.failed_count(),
                report.pending_count()
            ));
        }
        for status in &report.groups {
            if !self.compact {
                output.push_str("  ");
            }
            output.push_str(&status.to_string());
            output.push('\n');
            if let (false, GroupStatus::Resolved { confidence_metric, note, .. }) = (self.compact, status) {
                output.push_str(&format!("    error: {:.1} m | {}\n", confidence_metric, note));
            }
        }
        output
    }

    pub fn format_fix(&self, fix: &Fix) -> String {
        if self.compact {
            format!("{} {} {:.6} {:.6}", fix.group_id, fix.animal_id, fix.latitude, fix.longitude)
        } else {
            format!(
                "{} [{}] {:.6}°N, {:.6}°E at {} | {}",
                fix.group_id,
                fix.animal_id,
                fix.latitude,
                fix.longitude,
                fix.timestamp.to_rfc3339(),
                fix.note
            )
        }
    }
}

/// JSON rendering for reports and fix listings
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn format<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn report() -> BatchReport {
        BatchReport {
            recorded: 4,
            groups: vec![
                GroupStatus::Pending { group_id: "G1".into(), have: 1, required: 2 },
                GroupStatus::Resolved {
                    group_id: "G2".into(),
                    animal_id: "P04".into(),
                    latitude: 19.050_071_6,
                    longitude: 73.050_073_6,
                    confidence_metric: 0.0,
                    note: "Least squares: exact two-line intersection (2 bearings)".into(),
                },
                GroupStatus::Failed {
                    group_id: "G3".into(),
                    reason: "sightlines are parallel (numeric rank 1)".into(),
                },
            ],
        }
    }

    #[test]
    fn test_status_lines() {
        let r = report();
        assert_eq!(r.groups[0].to_string(), "G1: saved 1/2 readings, waiting for more");
        assert_eq!(r.groups[1].to_string(), "G2: fix calculated for P04 (19.05007, 73.05007)");
        assert!(r.groups[2].to_string().starts_with("G3: no fix (sightlines are parallel"));
    }

    #[test]
    fn test_pending_line_uses_required_count() {
        let raised = GroupStatus::Pending { group_id: "Q".into(), have: 2, required: 3 };
        assert_eq!(raised.to_string(), "Q: saved 2/3 readings, waiting for more");
    }

    #[test]
    fn test_text_report() {
        let full = TextFormatter::new().format_report(&report());
        assert!(full.starts_with("Recorded 4 observations in 3 groups (1 resolved, 1 failed, 1 pending)"));
        assert!(full.contains("    error: 0.0 m | Least squares"));

        let compact = TextFormatter::compact().format_report(&report());
        assert_eq!(compact.lines().count(), 3);
    }

    #[test]
    fn test_fix_lines() {
        let fix = Fix {
            group_id: "G2".into(),
            animal_id: "P04".into(),
            latitude: 19.05,
            longitude: 73.05,
            note: "Least squares: 3 bearings, error ±4.2 m".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 2, 1, 6, 30, 0).unwrap(),
        };
        assert_eq!(TextFormatter::compact().format_fix(&fix), "G2 P04 19.050000 73.050000");
        assert!(TextFormatter::new().format_fix(&fix).contains("2025-02-01T06:30:00+00:00"));
    }

    #[test]
    fn test_json_report() {
        let json = JsonFormatter::new().format(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["recorded"], 4);
        assert_eq!(value["groups"][1]["status"], "resolved");

        let pretty = JsonFormatter::pretty().format(&report()).unwrap();
        assert!(pretty.contains('\n'));
    }
}
