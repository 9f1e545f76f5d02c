//! Error taxonomy for the triangulation engine.
//!
//! Computational failures ([`ProjectionError`], [`GeometryError`]) are local to
//! one observation group and end up as a `Failed` status for that group.
//! [`ValidationError`] and [`PersistenceError`] are fatal to the whole batch
//! and surface to the caller as a [`FixError`] with nothing committed.

use thiserror::Error;

/// Malformed or incomplete observation record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("record {index}: missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("record {index}: invalid `{field}` = {value}: {reason}")]
    InvalidField {
        index: usize,
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("record {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
    #[error("malformed observation batch: {reason}")]
    MalformedBatch { reason: String },
}

impl ValidationError {
    /// Index of the offending record, if the error concerns a single record
    pub fn record_index(&self) -> Option<usize> {
        match self {
            ValidationError::MissingField { index, .. }
            | ValidationError::InvalidField { index, .. }
            | ValidationError::MalformedRecord { index, .. } => Some(*index),
            ValidationError::MalformedBatch { .. } => None,
        }
    }

    /// Name of the offending field
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingField { field, .. }
            | ValidationError::InvalidField { field, .. } => Some(*field),
            ValidationError::MalformedRecord { .. } | ValidationError::MalformedBatch { .. } => None,
        }
    }
}

/// Coordinates outside the projection's valid domain
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("non-finite coordinate ({first}, {second})")]
    NonFinite { first: f64, second: f64 },
    #[error("latitude {lat:.6} outside the UTM band [-80, 84]")]
    LatitudeOutOfRange { lat: f64 },
    #[error("longitude {lon:.6} is more than {max_offset_deg} deg from central meridian {central_meridian}")]
    OutsideZone {
        lon: f64,
        central_meridian: f64,
        max_offset_deg: f64,
    },
    #[error("invalid UTM zone {zone}: must be between 1 and 60")]
    InvalidZone { zone: u8 },
}

/// Degenerate or insufficient bearing geometry
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("insufficient constraints: {rows} sightlines, at least {required} required")]
    InsufficientConstraints { rows: usize, required: usize },
    #[error("system has {rows} rows but right-hand side has {rhs} entries")]
    DimensionMismatch { rows: usize, rhs: usize },
    #[error("sightlines are parallel (numeric rank {rank})")]
    ParallelSightlines { rank: usize },
    #[error("sightlines are nearly parallel (condition number {condition_number:.3e} exceeds {limit:.3e})")]
    IllConditioned { condition_number: f64, limit: f64 },
    #[error("least-squares solution is not finite")]
    NonFiniteSolution,
}

/// Failure of one group's triangulation pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriangulationError {
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// Storage collaborator failure
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("storage unavailable during {operation}: {reason}")]
    Unavailable { operation: &'static str, reason: String },
}

/// Batch-fatal error returned by the fix aggregator
#[derive(Debug, Error)]
pub enum FixError {
    #[error("batch rejected: {0}")]
    Validation(#[from] ValidationError),
    #[error("batch rolled back: {0}")]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_accessors() {
        let err = ValidationError::MissingField { index: 3, field: "group_id" };
        assert_eq!(err.record_index(), Some(3));
        assert_eq!(err.field(), Some("group_id"));
        assert_eq!(err.to_string(), "record 3: missing required field `group_id`");

        let batch = ValidationError::MalformedBatch { reason: "not an array".into() };
        assert_eq!(batch.record_index(), None);
        assert_eq!(batch.field(), None);

        let record = ValidationError::MalformedRecord { index: 2, reason: "expected an object".into() };
        assert_eq!(record.record_index(), Some(2));
        assert_eq!(record.field(), None);
        assert_eq!(record.to_string(), "record 2: expected an object");
    }

    #[test]
    fn test_triangulation_error_wraps_sources() {
        let err: TriangulationError = GeometryError::ParallelSightlines { rank: 1 }.into();
        assert!(matches!(err, TriangulationError::Geometry(_)));
        assert!(err.to_string().contains("parallel"));

        let err: TriangulationError = ProjectionError::LatitudeOutOfRange { lat: 85.0 }.into();
        assert!(matches!(err, TriangulationError::Projection(_)));
    }

    #[test]
    fn test_fix_error_from_persistence() {
        let err: FixError = PersistenceError::Unavailable {
            operation: "commit",
            reason: "disk full".into(),
        }
        .into();
        assert!(matches!(err, FixError::Persistence(_)));
        assert!(err.to_string().starts_with("batch rolled back"));
    }
}
