//! Batch input and output types

use serde::{Deserialize, Serialize};

/// One incoming observation record as submitted by a field device.
///
/// Every field is optional at this level so that missing values can be
/// reported precisely by the validator. Besides the snake_case names, the
/// camelCase names (`groupId`, `animalId`, `observerLatitude`, ...) and the
/// field app's short keys (`pango_id`, `lat`, `lon`, `bearing`, `accuracy`,
/// `time`, `observer`) are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    #[serde(default, alias = "groupId", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, alias = "animalId", alias = "pango_id", skip_serializing_if = "Option::is_none")]
    pub animal_id: Option<String>,
    #[serde(default, alias = "observerName", alias = "observer", skip_serializing_if = "Option::is_none")]
    pub observer_name: Option<String>,
    #[serde(default, alias = "observerLatitude", alias = "lat", skip_serializing_if = "Option::is_none")]
    pub observer_latitude: Option<f64>,
    #[serde(default, alias = "observerLongitude", alias = "lon", skip_serializing_if = "Option::is_none")]
    pub observer_longitude: Option<f64>,
    #[serde(default, alias = "bearingDegrees", alias = "bearing", skip_serializing_if = "Option::is_none")]
    pub bearing_degrees: Option<f64>,
    #[serde(default, alias = "gpsAccuracy", alias = "accuracy", skip_serializing_if = "Option::is_none")]
    pub gps_accuracy: Option<f64>,
    /// ISO-8601 / RFC 3339 timestamp
    #[serde(default, alias = "time", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ObservationRecord {
    /// Record with all required fields set
    pub fn new(group_id: &str, animal_id: &str, latitude: f64, longitude: f64, bearing_degrees: f64) -> Self {
        Self {
            group_id: Some(group_id.to_string()),
            animal_id: Some(animal_id.to_string()),
            observer_latitude: Some(latitude),
            observer_longitude: Some(longitude),
            bearing_degrees: Some(bearing_degrees),
            ..Self::default()
        }
    }

    pub fn with_observer(mut self, observer: &str) -> Self {
        self.observer_name = Some(observer.to_string());
        self
    }

    pub fn with_gps_accuracy(mut self, accuracy_m: f64) -> Self {
        self.gps_accuracy = Some(accuracy_m);
        self
    }

    pub fn with_timestamp(mut self, timestamp: &str) -> Self {
        self.timestamp = Some(timestamp.to_string());
        self
    }
}

/// Outcome for one observation group after a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GroupStatus {
    /// Fewer observations on file than a fix needs
    Pending {
        group_id: String,
        have: usize,
        required: usize,
    },
    /// Fix computed and stored
    Resolved {
        group_id: String,
        animal_id: String,
        latitude: f64,
        longitude: f64,
        confidence_metric: f64,
        note: String,
    },
    /// Triangulation failed; no fix stored for this batch
    Failed { group_id: String, reason: String },
}

impl GroupStatus {
    pub fn group_id(&self) -> &str {
        match self {
            GroupStatus::Pending { group_id, .. }
            | GroupStatus::Resolved { group_id, .. }
            | GroupStatus::Failed { group_id, .. } => group_id,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, GroupStatus::Resolved { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, GroupStatus::Failed { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, GroupStatus::Pending { .. })
    }
}

/// Structured result of one processed batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Observations recorded by this batch
    pub recorded: usize,
    /// One status per touched group, in order of first appearance
    pub groups: Vec<GroupStatus>,
}

impl BatchReport {
    pub fn status_for(&self, group_id: &str) -> Option<&GroupStatus> {
        self.groups.iter().find(|s| s.group_id() == group_id)
    }

    pub fn resolved_count(&self) -> usize {
        self.groups.iter().filter(|s| s.is_resolved()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.groups.iter().filter(|s| s.is_failed()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.groups.iter().filter(|s| s.is_pending()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_app_aliases() {
        let json = r#"{"group_id":"G1","pango_id":"P03","observer":"MK",
                       "lat":19.05,"lon":73.05,"bearing":45.0,"accuracy":4.0,
                       "time":"2025-02-01T06:30:00Z"}"#;
        let record: ObservationRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.animal_id.as_deref(), Some("P03"));
        assert_eq!(record.observer_name.as_deref(), Some("MK"));
        assert_eq!(record.observer_latitude, Some(19.05));
        assert_eq!(record.bearing_degrees, Some(45.0));
        assert_eq!(record.gps_accuracy, Some(4.0));
        assert_eq!(record.timestamp.as_deref(), Some("2025-02-01T06:30:00Z"));
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let record: ObservationRecord = serde_json::from_str(r#"{"group_id":"G1"}"#).unwrap();
        assert_eq!(record.group_id.as_deref(), Some("G1"));
        assert!(record.animal_id.is_none());
        assert!(record.bearing_degrees.is_none());
    }

    #[test]
    fn test_status_serialization_is_tagged() {
        let status = GroupStatus::Pending { group_id: "G7".into(), have: 1, required: 2 };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["have"], 1);
        assert_eq!(json["required"], 2);
    }

    #[test]
    fn test_report_counts() {
        let report = BatchReport {
            recorded: 3,
            groups: vec![
                GroupStatus::Pending { group_id: "A".into(), have: 1, required: 2 },
                GroupStatus::Failed { group_id: "B".into(), reason: "parallel".into() },
                GroupStatus::Resolved {
                    group_id: "C".into(),
                    animal_id: "P01".into(),
                    latitude: 19.0,
                    longitude: 73.0,
                    confidence_metric: 0.0,
                    note: "exact".into(),
                },
            ],
        };

        assert_eq!(report.pending_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.resolved_count(), 1);
        assert!(report.status_for("C").unwrap().is_resolved());
        assert!(report.status_for("Z").is_none());
    }
}
