//! Bearing Fix Engine
//!
//! Locates tracked animals from directional sightings taken by independent
//! field observers. Observer positions are projected to UTM, the sightlines
//! are intersected by least squares and the solution is projected back to
//! latitude/longitude together with an error score in meters.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod storage;
pub mod utils;
pub mod api;
pub mod synthetic;

// Re-export commonly used types
pub use core::{Fix, GeodeticPoint, Observation, PlanarPoint};
pub use algorithms::{SolverSettings, Triangulation, Triangulator, UtmProjection};
pub use processing::{FixAggregator, GroupLocks};
pub use validation::{
    DataValidator, FixError, GeometryError, PersistenceError, ProjectionError, TriangulationError, ValidationError,
};
pub use storage::{AnimalRegistry, FixStore, MemoryStore, StoreSnapshot, StoreTransaction};
pub use utils::{ConfigError, EngineConfig, ProjectionConfig};
pub use api::{BatchReport, GroupStatus, JsonFormatter, ObservationRecord, TextFormatter};
