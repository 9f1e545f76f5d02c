//! Triangulation algorithms

pub mod projection;
pub mod bearing;
pub mod linear_system;
pub mod least_squares;
pub mod error_score;
pub mod triangulation;

pub use projection::UtmProjection;
pub use linear_system::{build_system, LinearSystem, Sightline};
pub use least_squares::LeastSquaresSolution;
pub use triangulation::{SolverSettings, Triangulation, Triangulator};
