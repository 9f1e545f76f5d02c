//! Geodetic <-> planar coordinate transformation.
//!
//! A single WGS84 Universal Transverse Mercator zone is used for the whole
//! pipeline. The forward and inverse mappings use the Krüger series
//! (third order in the third flattening `n`), which stays well below a
//! millimetre of error inside the zone and its usual overlap.
//!
//! The projection is an immutable value: build it once from configuration and
//! hand it to every component that needs it.

use crate::core::{
    GeodeticPoint, PlanarPoint, UTM_FALSE_EASTING, UTM_FALSE_NORTHING_SOUTH, UTM_MAX_LATITUDE,
    UTM_MIN_LATITUDE, UTM_SCALE_FACTOR, WGS84_FLATTENING, WGS84_SEMI_MAJOR_AXIS,
};
use crate::validation::error::ProjectionError;

/// Default tolerance for longitudes outside the nominal 6 degree zone width
pub const DEFAULT_MAX_MERIDIAN_OFFSET_DEG: f64 = 10.0;

/// Precomputed Krüger series coefficients for an ellipsoid
#[derive(Debug, Clone, Copy, PartialEq)]
struct KrugerSeries {
    /// Rectifying radius A scaled by k0
    scaled_radius: f64,
    eccentricity: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

impl KrugerSeries {
    fn new(semi_major_axis: f64, flattening: f64, scale_factor: f64) -> Self {
        let n = flattening / (2.0 - flattening);
        let n2 = n * n;
        let n3 = n2 * n;
        let rectifying_radius = semi_major_axis / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0);

        Self {
            scaled_radius: scale_factor * rectifying_radius,
            eccentricity: 2.0 * n.sqrt() / (1.0 + n),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
        }
    }
}

/// WGS84 UTM projection for one fixed zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmProjection {
    zone: u8,
    northern: bool,
    central_meridian_deg: f64,
    max_meridian_offset_deg: f64,
    series: KrugerSeries,
}

impl UtmProjection {
    /// Create a projection for `zone` (1..=60) in the given hemisphere
    pub fn new(zone: u8, northern: bool) -> Result<Self, ProjectionError> {
        if !(1..=60).contains(&zone) {
            return Err(ProjectionError::InvalidZone { zone });
        }

        Ok(Self {
            zone,
            northern,
            central_meridian_deg: (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0,
            max_meridian_offset_deg: DEFAULT_MAX_MERIDIAN_OFFSET_DEG,
            series: KrugerSeries::new(WGS84_SEMI_MAJOR_AXIS, WGS84_FLATTENING, UTM_SCALE_FACTOR),
        })
    }

    /// Create a projection from a WGS84 / UTM EPSG code (326zz north, 327zz south)
    pub fn from_epsg(code: u32) -> Result<Self, ProjectionError> {
        match code {
            32601..=32660 => Self::new((code - 32600) as u8, true),
            32701..=32760 => Self::new((code - 32700) as u8, false),
            _ => Err(ProjectionError::InvalidZone { zone: 0 }),
        }
    }

    /// Widen or narrow the accepted longitude band around the central meridian
    pub fn with_max_meridian_offset(mut self, offset_deg: f64) -> Self {
        self.max_meridian_offset_deg = offset_deg.abs();
        self
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    pub fn is_northern(&self) -> bool {
        self.northern
    }

    pub fn central_meridian(&self) -> f64 {
        self.central_meridian_deg
    }

    pub fn epsg_code(&self) -> u32 {
        let base = if self.northern { 32600 } else { 32700 };
        base + self.zone as u32
    }

    /// Project a geodetic point onto the zone's planar grid (meters)
    pub fn to_planar(&self, point: GeodeticPoint) -> Result<PlanarPoint, ProjectionError> {
        self.check_domain(point)?;

        let s = &self.series;
        let phi = point.lat.to_radians();
        let lambda = (point.lon - self.central_meridian_deg).to_radians();

        // Conformal latitude expressed through its tangent
        let sin_phi = phi.sin();
        let t = (sin_phi.atanh() - s.eccentricity * (s.eccentricity * sin_phi).atanh()).sinh();
        let xi_prime = t.atan2(lambda.cos());
        let eta_prime = (lambda.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (j, alpha) in s.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += alpha * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += alpha * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }

        Ok(PlanarPoint {
            x: UTM_FALSE_EASTING + s.scaled_radius * eta,
            y: self.false_northing() + s.scaled_radius * xi,
        })
    }

    /// Map a planar grid point back to geodetic latitude/longitude
    pub fn to_geodetic(&self, point: PlanarPoint) -> Result<GeodeticPoint, ProjectionError> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(ProjectionError::NonFinite { first: point.x, second: point.y });
        }

        let s = &self.series;
        let xi = (point.y - self.false_northing()) / s.scaled_radius;
        let eta = (point.x - UTM_FALSE_EASTING) / s.scaled_radius;

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, beta) in s.beta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi_prime -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_prime.sin() / eta_prime.cosh()).clamp(-1.0, 1.0).asin();
        let mut phi = chi;
        for (j, delta) in s.delta.iter().enumerate() {
            phi += delta * (2.0 * (j as f64 + 1.0) * chi).sin();
        }
        let lambda = eta_prime.sinh().atan2(xi_prime.cos());

        let result = GeodeticPoint {
            lat: phi.to_degrees(),
            lon: self.central_meridian_deg + lambda.to_degrees(),
        };
        self.check_domain(result)?;
        Ok(result)
    }

    fn false_northing(&self) -> f64 {
        if self.northern {
            0.0
        } else {
            UTM_FALSE_NORTHING_SOUTH
        }
    }

    fn check_domain(&self, point: GeodeticPoint) -> Result<(), ProjectionError> {
        if !point.lat.is_finite() || !point.lon.is_finite() {
            return Err(ProjectionError::NonFinite { first: point.lat, second: point.lon });
        }
        if !(UTM_MIN_LATITUDE..=UTM_MAX_LATITUDE).contains(&point.lat) {
            return Err(ProjectionError::LatitudeOutOfRange { lat: point.lat });
        }
        if (point.lon - self.central_meridian_deg).abs() > self.max_meridian_offset_deg {
            return Err(ProjectionError::OutsideZone {
                lon: point.lon,
                central_meridian: self.central_meridian_deg,
                max_offset_deg: self.max_meridian_offset_deg,
            });
        }
        Ok(())
    }
}
