//! Ingestion-boundary validation of observation batches.
//!
//! A batch is accepted only if every record is complete and well formed;
//! the first bad record rejects the whole batch.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::algorithms::bearing::normalize_bearing;
use crate::api::types::ObservationRecord;
use crate::core::{GeodeticPoint, Observation, DEFAULT_OBSERVER_TAG};
use crate::validation::error::ValidationError;

/// Naive timestamp layouts accepted in addition to RFC 3339; read as UTC
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq)]
enum JsonKind {
    Text,
    Number,
}

/// Record fields with every key they may arrive under and their JSON type
const RECORD_FIELDS: [(&str, &[&str], JsonKind); 8] = [
    ("group_id", &["group_id", "groupId"], JsonKind::Text),
    ("animal_id", &["animal_id", "animalId", "pango_id"], JsonKind::Text),
    ("observer_name", &["observer_name", "observerName", "observer"], JsonKind::Text),
    ("observer_latitude", &["observer_latitude", "observerLatitude", "lat"], JsonKind::Number),
    ("observer_longitude", &["observer_longitude", "observerLongitude", "lon"], JsonKind::Number),
    ("bearing_degrees", &["bearing_degrees", "bearingDegrees", "bearing"], JsonKind::Number),
    ("gps_accuracy", &["gps_accuracy", "gpsAccuracy", "accuracy"], JsonKind::Number),
    ("timestamp", &["timestamp", "time"], JsonKind::Text),
];

/// Converts raw records into immutable [`Observation`]s
#[derive(Debug, Clone)]
pub struct DataValidator {
    default_observer: String,
}

impl Default for DataValidator {
    fn default() -> Self {
        Self {
            default_observer: DEFAULT_OBSERVER_TAG.to_string(),
        }
    }
}

impl DataValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_observer(observer: &str) -> Self {
        Self {
            default_observer: observer.to_string(),
        }
    }

    /// Parse a JSON array of observation records.
    ///
    /// A record holding a value of the wrong JSON type is reported with its
    /// index and field name.
    pub fn parse_batch(json: &str) -> Result<Vec<ObservationRecord>, ValidationError> {
        let values: Vec<Value> =
            serde_json::from_str(json).map_err(|e| ValidationError::MalformedBatch { reason: e.to_string() })?;
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| parse_record(index, value))
            .collect()
    }

    /// Validate every record of a batch.
    ///
    /// Records without a timestamp are stamped with `received_at`.
    pub fn validate_batch(
        &self,
        records: &[ObservationRecord],
        received_at: DateTime<Utc>,
    ) -> Result<Vec<Observation>, ValidationError> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| self.validate_record(index, record, received_at))
            .collect()
    }

    /// Validate a single record at position `index` of its batch
    pub fn validate_record(
        &self,
        index: usize,
        record: &ObservationRecord,
        received_at: DateTime<Utc>,
    ) -> Result<Observation, ValidationError> {
        let group_id = required_text(index, "group_id", record.group_id.as_deref())?;
        let animal_id = required_text(index, "animal_id", record.animal_id.as_deref())?;

        let lat = required_number(index, "observer_latitude", record.observer_latitude)?;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(invalid(index, "observer_latitude", lat, "must be within [-90, 90]"));
        }
        let lon = required_number(index, "observer_longitude", record.observer_longitude)?;
        if !(-180.0..=180.0).contains(&lon) {
            return Err(invalid(index, "observer_longitude", lon, "must be within [-180, 180]"));
        }
        let bearing = required_number(index, "bearing_degrees", record.bearing_degrees)?;

        let gps_accuracy_m = match record.gps_accuracy {
            Some(accuracy) if !accuracy.is_finite() || accuracy < 0.0 => {
                return Err(invalid(index, "gps_accuracy", accuracy, "must be a non-negative number"));
            }
            other => other,
        };

        let observer = record
            .observer_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.default_observer.as_str())
            .to_string();

        let timestamp = match record.timestamp.as_deref() {
            Some(text) => parse_timestamp(text).ok_or_else(|| ValidationError::InvalidField {
                index,
                field: "timestamp",
                value: text.to_string(),
                reason: "expected an ISO-8601 timestamp".to_string(),
            })?,
            None => received_at,
        };

        Ok(Observation {
            group_id,
            animal_id,
            observer,
            position: GeodeticPoint::new(lat, lon),
            bearing_deg: normalize_bearing(bearing),
            gps_accuracy_m,
            timestamp,
        })
    }
}

fn parse_record(index: usize, value: Value) -> Result<ObservationRecord, ValidationError> {
    let object = value.as_object().ok_or_else(|| ValidationError::MalformedRecord {
        index,
        reason: format!("expected an object, found {}", value),
    })?;

    for (field, keys, kind) in RECORD_FIELDS {
        for key in keys {
            let found = match object.get(*key) {
                None | Some(Value::Null) => continue,
                Some(found) => found,
            };
            let expected = match kind {
                JsonKind::Text if !found.is_string() => "expected a string",
                JsonKind::Number if !found.is_number() => "expected a number",
                _ => continue,
            };
            return Err(ValidationError::InvalidField {
                index,
                field,
                value: found.to_string(),
                reason: expected.to_string(),
            });
        }
    }

    serde_json::from_value(value).map_err(|e| ValidationError::MalformedRecord {
        index,
        reason: e.to_string(),
    })
}

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one taken as UTC
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

fn required_text(index: usize, field: &'static str, value: Option<&str>) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        None => Err(ValidationError::MissingField { index, field }),
        Some("") => Err(ValidationError::InvalidField {
            index,
            field,
            value: String::new(),
            reason: "must not be empty".to_string(),
        }),
        Some(text) => Ok(text.to_string()),
    }
}

fn required_number(index: usize, field: &'static str, value: Option<f64>) -> Result<f64, ValidationError> {
    match value {
        None => Err(ValidationError::MissingField { index, field }),
        Some(v) if !v.is_finite() => Err(invalid(index, field, v, "must be finite")),
        Some(v) => Ok(v),
    }
}

fn invalid(index: usize, field: &'static str, value: f64, reason: &str) -> ValidationError {
    ValidationError::InvalidField {
        index,
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 5, 0, 0).unwrap()
    }

    #[test]
    fn test_complete_record() {
        let record = ObservationRecord::new("G1", "P01", 19.05, 73.05, 45.0)
            .with_observer("MK")
            .with_gps_accuracy(3.5)
            .with_timestamp("2025-02-28T22:10:00+05:30");

        let obs = DataValidator::new().validate_record(0, &record, now()).unwrap();
        assert_eq!(obs.group_id, "G1");
        assert_eq!(obs.animal_id, "P01");
        assert_eq!(obs.observer, "MK");
        assert_eq!(obs.gps_accuracy_m, Some(3.5));
        assert_eq!(obs.timestamp, Utc.with_ymd_and_hms(2025, 2, 28, 16, 40, 0).unwrap());
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let record = ObservationRecord::new("G1", "P01", 19.05, 73.05, 45.0);
        let obs = DataValidator::new().validate_record(0, &record, now()).unwrap();

        assert_eq!(obs.observer, DEFAULT_OBSERVER_TAG);
        assert_eq!(obs.gps_accuracy_m, None);
        assert_eq!(obs.timestamp, now());
    }

    #[test]
    fn test_bearing_is_normalized() {
        let record = ObservationRecord::new("G1", "P01", 19.05, 73.05, -90.0);
        let obs = DataValidator::new().validate_record(0, &record, now()).unwrap();
        assert_eq!(obs.bearing_deg, 270.0);
    }

    #[test]
    fn test_missing_required_field_names_record_and_field() {
        let good = ObservationRecord::new("G1", "P01", 19.05, 73.05, 45.0);
        let mut bad = good.clone();
        bad.bearing_degrees = None;

        let err = DataValidator::new().validate_batch(&[good, bad], now()).unwrap_err();
        assert_eq!(err, ValidationError::MissingField { index: 1, field: "bearing_degrees" });
    }

    #[test]
    fn test_invalid_values_rejected() {
        let validator = DataValidator::new();
        let cases = [
            (ObservationRecord::new(" ", "P01", 19.05, 73.05, 45.0), "group_id"),
            (ObservationRecord::new("G1", "", 19.05, 73.05, 45.0), "animal_id"),
            (ObservationRecord::new("G1", "P01", 91.0, 73.05, 45.0), "observer_latitude"),
            (ObservationRecord::new("G1", "P01", 19.05, -181.0, 45.0), "observer_longitude"),
            (ObservationRecord::new("G1", "P01", 19.05, 73.05, f64::NAN), "bearing_degrees"),
            (ObservationRecord::new("G1", "P01", 19.05, 73.05, 45.0).with_gps_accuracy(-1.0), "gps_accuracy"),
            (ObservationRecord::new("G1", "P01", 19.05, 73.05, 45.0).with_timestamp("yesterday"), "timestamp"),
        ];

        for (record, field) in cases {
            let err = validator.validate_record(4, &record, now()).unwrap_err();
            assert_eq!(err.field(), Some(field));
            assert_eq!(err.record_index(), Some(4));
        }
    }

    #[test]
    fn test_naive_timestamps_read_as_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 9, 7, 15, 30).unwrap();
        assert_eq!(parse_timestamp("2025-01-09T07:15:30"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-09 07:15:30.000"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-09T07:15:30Z"), Some(expected));
        assert_eq!(parse_timestamp("09/01/2025"), None);
    }

    #[test]
    fn test_parse_batch() {
        let records = DataValidator::parse_batch(
            r#"[{"group_id":"G1","pango_id":"P01","lat":19.05,"lon":73.05,"bearing":45}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 1);

        let err = DataValidator::parse_batch(r#"{"group_id":"G1"}"#).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedBatch { .. }));
    }

    #[test]
    fn test_parse_batch_reports_wrongly_typed_field() {
        let err = DataValidator::parse_batch(
            r#"[
                {"group_id":"G1","animal_id":"P01","observer_latitude":19.05,"observer_longitude":73.05,"bearing_degrees":45},
                {"group_id":"G1","animal_id":"P01","observer_latitude":19.052,"observer_longitude":73.048,"bearing":"135"}
            ]"#,
        )
        .unwrap_err();

        assert_eq!(err.record_index(), Some(1));
        assert_eq!(err.field(), Some("bearing_degrees"));
        assert!(err.to_string().contains("expected a number"));

        let err = DataValidator::parse_batch(r#"[{"groupId":7}]"#).unwrap_err();
        assert_eq!(err.record_index(), Some(0));
        assert_eq!(err.field(), Some("group_id"));
    }

    #[test]
    fn test_parse_batch_rejects_non_object_record() {
        let err = DataValidator::parse_batch(r#"[{"group_id":"G1"}, 42]"#).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedRecord { index: 1, .. }));
    }

    #[test]
    fn test_parse_batch_accepts_null_optional_fields() {
        let records = DataValidator::parse_batch(
            r#"[{"groupId":"G1","animalId":"P01","observerLatitude":19.05,"observerLongitude":73.05,
                 "bearingDegrees":45,"gpsAccuracy":null,"observerName":null}]"#,
        )
        .unwrap();
        assert_eq!(records[0], ObservationRecord::new("G1", "P01", 19.05, 73.05, 45.0));
    }

    #[test]
    fn test_every_accepted_key_reaches_its_field() {
        for (field, keys, kind) in RECORD_FIELDS {
            for key in keys {
                let sample = match kind {
                    JsonKind::Text => Value::from("2025-01-09T07:15:30Z"),
                    JsonKind::Number => Value::from(12.5),
                };
                let mut object = serde_json::Map::new();
                object.insert(key.to_string(), sample.clone());
                let json = Value::Array(vec![Value::Object(object)]).to_string();
                let record = DataValidator::parse_batch(&json).unwrap().remove(0);
                let stored = serde_json::to_value(&record).unwrap();
                assert_eq!(stored[field], sample, "key {} should fill {}", key, field);
            }
        }
    }
}
