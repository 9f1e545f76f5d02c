use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::algorithms::projection::{UtmProjection, DEFAULT_MAX_MERIDIAN_OFFSET_DEG};
use crate::algorithms::triangulation::{SolverSettings, Triangulator};
use crate::core::{DEFAULT_OBSERVER_TAG, DEFAULT_UTM_ZONE, MIN_OBSERVATIONS_FOR_FIX};

/// Engine-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Planar projection shared by the forward and inverse mappings
    pub projection: ProjectionConfig,
    /// Numeric limits for the least-squares stage
    pub solver: SolverSettings,
    /// Observations a group needs before a fix is attempted
    pub min_observations: usize,
    /// Keep the previous fix when a recomputation fails instead of deleting it
    pub retain_fix_on_failure: bool,
    /// Solve the groups of a batch on the rayon thread pool
    pub parallel: bool,
    /// Observer tag recorded for sightings that carry none
    pub default_observer: String,
}

/// UTM zone selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub utm_zone: u8,
    pub northern_hemisphere: bool,
    /// Longitudes further than this from the central meridian are rejected (degrees)
    pub max_meridian_offset_deg: f64,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid parameter {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionConfig::default(),
            solver: SolverSettings::default(),
            min_observations: MIN_OBSERVATIONS_FOR_FIX,
            retain_fix_on_failure: false,
            parallel: true,
            default_observer: DEFAULT_OBSERVER_TAG.to_string(),
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            utm_zone: DEFAULT_UTM_ZONE,
            northern_hemisphere: true,
            max_meridian_offset_deg: DEFAULT_MAX_MERIDIAN_OFFSET_DEG,
        }
    }
}

impl ProjectionConfig {
    pub fn build(&self) -> Result<UtmProjection, ConfigError> {
        let projection = UtmProjection::new(self.utm_zone, self.northern_hemisphere).map_err(|e| {
            invalid("projection.utm_zone", self.utm_zone, &e.to_string())
        })?;
        Ok(projection.with_max_meridian_offset(self.max_meridian_offset_deg))
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file and validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn with_projection(mut self, utm_zone: u8, northern_hemisphere: bool) -> Self {
        self.projection.utm_zone = utm_zone;
        self.projection.northern_hemisphere = northern_hemisphere;
        self
    }

    pub fn with_retain_fix_on_failure(mut self, retain: bool) -> Self {
        self.retain_fix_on_failure = retain;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_solver(mut self, solver: SolverSettings) -> Self {
        self.solver = solver;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=60).contains(&self.projection.utm_zone) {
            return Err(invalid("projection.utm_zone", self.projection.utm_zone, "must be between 1 and 60"));
        }
        let offset = self.projection.max_meridian_offset_deg;
        if !offset.is_finite() || offset < 3.0 || offset > 30.0 {
            return Err(invalid(
                "projection.max_meridian_offset_deg",
                offset,
                "must cover the 3 degree half-zone and stay below 30 degrees",
            ));
        }
        let tolerance = self.solver.rank_tolerance;
        if !tolerance.is_finite() || tolerance <= 0.0 || tolerance >= 1.0 {
            return Err(invalid("solver.rank_tolerance", tolerance, "must be in (0, 1)"));
        }
        let limit = self.solver.max_condition_number;
        if limit.is_nan() || limit < 1.0 {
            return Err(invalid("solver.max_condition_number", limit, "must be at least 1"));
        }
        if self.min_observations < MIN_OBSERVATIONS_FOR_FIX {
            return Err(invalid(
                "min_observations",
                self.min_observations,
                "two sightlines are the minimum for an intersection",
            ));
        }
        if self.default_observer.trim().is_empty() {
            return Err(invalid("default_observer", "\"\"", "must not be empty"));
        }
        Ok(())
    }

    /// Build the triangulation engine described by this configuration
    pub fn build_triangulator(&self) -> Result<Triangulator, ConfigError> {
        self.validate()?;
        Ok(Triangulator::new(self.projection.build()?, self.solver))
    }
}

fn invalid(parameter: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
