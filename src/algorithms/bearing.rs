//! Compass bearing helpers

use crate::core::GeodeticPoint;

/// Unit direction vector `(dx, dy)` for a bearing in degrees clockwise from north.
///
/// `x` points east and `y` points north. Any real input is accepted; bearings
/// outside [0, 360) produce the vector of their modulo-360 equivalent.
pub fn unit_vector(bearing_deg: f64) -> (f64, f64) {
    let (sin, cos) = bearing_deg.to_radians().sin_cos();
    (sin, cos)
}

/// Wrap a bearing into [0, 360)
pub fn normalize_bearing(bearing_deg: f64) -> f64 {
    let wrapped = bearing_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Initial great-circle bearing from `from` towards `to`, in [0, 360)
pub fn initial_bearing(from: GeodeticPoint, to: GeodeticPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lon = (to.lon - from.lon).to_radians();

    let x = lat2.cos() * d_lon.sin();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    normalize_bearing(x.atan2(y).to_degrees())
}
