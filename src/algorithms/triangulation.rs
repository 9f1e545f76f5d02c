//! Bearing triangulation pipeline: project, build, solve, project back, score.

use serde::{Deserialize, Serialize};

use crate::algorithms::error_score;
use crate::algorithms::least_squares::{self, DEFAULT_RANK_TOLERANCE};
use crate::algorithms::linear_system::{build_system, Sightline};
use crate::algorithms::projection::UtmProjection;
use crate::core::{GeodeticPoint, Observation, PlanarPoint};
use crate::validation::error::{GeometryError, TriangulationError};

/// Numeric limits applied by the solver stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Singular values below `rank_tolerance * sigma_max` count as zero
    pub rank_tolerance: f64,
    /// Solutions with a larger condition number are rejected as near-parallel
    pub max_condition_number: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
            max_condition_number: 1.0e4,
        }
    }
}

/// Successful triangulation of one group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangulation {
    pub position: GeodeticPoint,
    pub planar: PlanarPoint,
    /// Average sightline disagreement in meters (0 for two sightlines)
    pub confidence_metric: f64,
    pub residual_sum_of_squares: f64,
    pub observation_count: usize,
    pub condition_number: f64,
}

impl Triangulation {
    /// Free-text summary of method and error stored with the fix
    pub fn quality_note(&self) -> String {
        if self.observation_count <= 2 {
            format!(
                "Least squares: exact two-line intersection ({} bearings)",
                self.observation_count
            )
        } else {
            format!(
                "Least squares: {} bearings, error ±{:.1} m",
                self.observation_count, self.confidence_metric
            )
        }
    }
}

/// Stateless triangulation engine; safe to share across threads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangulator {
    projection: UtmProjection,
    settings: SolverSettings,
}

impl Triangulator {
    pub fn new(projection: UtmProjection, settings: SolverSettings) -> Self {
        Self { projection, settings }
    }

    pub fn projection(&self) -> &UtmProjection {
        &self.projection
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Locate the target sighted along `(observer position, bearing)` pairs
    pub fn triangulate(&self, readings: &[(GeodeticPoint, f64)]) -> Result<Triangulation, TriangulationError> {
        let sightlines = readings
            .iter()
            .map(|(position, bearing)| Ok(Sightline::new(self.projection.to_planar(*position)?, *bearing)))
            .collect::<Result<Vec<_>, TriangulationError>>()?;

        let solution = least_squares::solve(&build_system(&sightlines), self.settings.rank_tolerance)?;
        if solution.condition_number > self.settings.max_condition_number {
            return Err(GeometryError::IllConditioned {
                condition_number: solution.condition_number,
                limit: self.settings.max_condition_number,
            }
            .into());
        }

        let position = self.projection.to_geodetic(solution.point)?;
        Ok(Triangulation {
            position,
            planar: solution.point,
            confidence_metric: error_score::score(solution.residual_sum_of_squares, sightlines.len()),
            residual_sum_of_squares: solution.residual_sum_of_squares,
            observation_count: sightlines.len(),
            condition_number: solution.condition_number,
        })
    }

    pub fn triangulate_observations(&self, observations: &[Observation]) -> Result<Triangulation, TriangulationError> {
        let readings: Vec<(GeodeticPoint, f64)> = observations
            .iter()
            .map(|o| (o.position, o.bearing_deg))
            .collect();
        self.triangulate(&readings)
    }
}
