//! Sightline constraint assembly.
//!
//! A target `p` on the ray through observer `o` with direction `d` satisfies
//! `cross(p - o, d) = 0`, which is linear in `p`:
//!
//! ```text
//! dy * px - dx * py = dy * ox - dx * oy
//! ```
//!
//! Since `d` is a unit vector, the violation of a row at any point equals the
//! perpendicular distance from that point to the sightline.

use nalgebra::{DMatrix, DVector};

use crate::algorithms::bearing::unit_vector;
use crate::core::PlanarPoint;

/// An observer position on the planar grid and the bearing it sighted along
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sightline {
    pub origin: PlanarPoint,
    pub bearing_deg: f64,
}

impl Sightline {
    pub fn new(origin: PlanarPoint, bearing_deg: f64) -> Self {
        Self { origin, bearing_deg }
    }

    /// Coefficients `([a0, a1], b)` of this sightline's constraint row
    pub fn constraint(&self) -> ([f64; 2], f64) {
        let (dx, dy) = unit_vector(self.bearing_deg);
        ([dy, -dx], dy * self.origin.x - dx * self.origin.y)
    }

    /// Signed perpendicular distance from `point` to this sightline
    pub fn offset(&self, point: PlanarPoint) -> f64 {
        let ([a0, a1], b) = self.constraint();
        a0 * point.x + a1 * point.y - b
    }
}

/// Overdetermined system `A p = b`, one row per sightline
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
}

impl LinearSystem {
    pub fn rows(&self) -> usize {
        self.a.nrows()
    }
}

/// Build the linear system for a set of sightlines
pub fn build_system(sightlines: &[Sightline]) -> LinearSystem {
    let mut a = DMatrix::zeros(sightlines.len(), 2);
    let mut b = DVector::zeros(sightlines.len());

    for (row, sightline) in sightlines.iter().enumerate() {
        let ([a0, a1], rhs) = sightline.constraint();
        a[(row, 0)] = a0;
        a[(row, 1)] = a1;
        b[row] = rhs;
    }

    LinearSystem { a, b }
}
