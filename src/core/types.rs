//! Core data types for the triangulation engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeodeticPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance in meters (haversine, mean Earth radius)
    pub fn distance_to(&self, other: &GeodeticPoint) -> f64 {
        const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let h = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * MEAN_EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
    }
}

/// Projected coordinates in meters (x = easting, y = northing)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &PlanarPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One observer's sighting of an animal.
///
/// Observations are immutable once recorded: the engine reads them and never
/// rewrites or deletes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub group_id: String,
    pub animal_id: String,
    pub observer: String,
    pub position: GeodeticPoint,
    /// Degrees clockwise from north, normalized into [0, 360)
    pub bearing_deg: f64,
    /// Reported GPS accuracy of the observer position (meters)
    pub gps_accuracy_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Location estimate for one observation group.
///
/// At most one fix exists per group id; recomputation replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub group_id: String,
    pub animal_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

impl Fix {
    pub fn position(&self) -> GeodeticPoint {
        GeodeticPoint::new(self.latitude, self.longitude)
    }
}
