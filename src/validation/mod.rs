//! Input validation and the engine's error taxonomy

pub mod data;
pub mod error;

pub use data::DataValidator;
pub use error::{FixError, GeometryError, PersistenceError, ProjectionError, TriangulationError, ValidationError};
