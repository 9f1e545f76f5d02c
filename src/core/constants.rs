//! Geodetic constants and engine defaults

/// WGS84 semi-major axis (meters)
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6378137.0;

/// WGS84 flattening
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257223563;

/// UTM central scale factor
pub const UTM_SCALE_FACTOR: f64 = 0.9996;

/// UTM false easting (meters)
pub const UTM_FALSE_EASTING: f64 = 500_000.0;

/// UTM false northing for the southern hemisphere (meters)
pub const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Latitude limits of the UTM grid (degrees)
pub const UTM_MIN_LATITUDE: f64 = -80.0;
pub const UTM_MAX_LATITUDE: f64 = 84.0;

/// Zone covering the reference deployment (Konkan coast, 72°E–78°E)
pub const DEFAULT_UTM_ZONE: u8 = 43;

/// Fewest observations a group needs before a fix can be attempted
pub const MIN_OBSERVATIONS_FOR_FIX: usize = 2;

/// Observer tag recorded when a sighting carries none
pub const DEFAULT_OBSERVER_TAG: &str = "--";
