//! SVD-based least-squares solver for the sightline system

use crate::algorithms::linear_system::LinearSystem;
use crate::core::PlanarPoint;
use crate::validation::error::GeometryError;

/// Relative singular-value cutoff used when no tolerance is configured
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-10;

/// Result of a least-squares solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeastSquaresSolution {
    /// Most likely intersection point on the planar grid
    pub point: PlanarPoint,
    /// Sum of squared constraint violations; 0 for an exactly determined system
    pub residual_sum_of_squares: f64,
    /// Numeric rank of the design matrix
    pub rank: usize,
    /// Ratio of largest to smallest singular value
    pub condition_number: f64,
}

/// Solve `A p = b` for the minimum-norm least-squares point.
///
/// Singular values below `rank_tolerance * sigma_max` are treated as zero, so
/// a borderline-parallel pair still yields a best-effort answer. Callers
/// should inspect `condition_number` before trusting such a result.
pub fn solve(system: &LinearSystem, rank_tolerance: f64) -> Result<LeastSquaresSolution, GeometryError> {
    let rows = system.rows();
    if rows < 2 {
        return Err(GeometryError::InsufficientConstraints { rows, required: 2 });
    }
    if system.b.len() != rows {
        return Err(GeometryError::DimensionMismatch { rows, rhs: system.b.len() });
    }

    let svd = system.a.clone().svd(true, true);
    let sigma_max = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let sigma_min = svd.singular_values.iter().cloned().fold(f64::INFINITY, f64::min);

    let cutoff = rank_tolerance.max(0.0) * sigma_max;
    let rank = svd.singular_values.iter().filter(|&&s| s > cutoff).count();
    let condition_number = if sigma_min > 0.0 { sigma_max / sigma_min } else { f64::INFINITY };

    if rank < 2 {
        return Err(GeometryError::ParallelSightlines { rank });
    }

    let solution = svd
        .solve(&system.b, cutoff)
        .map_err(|_| GeometryError::NonFiniteSolution)?;
    if !solution.iter().all(|v| v.is_finite()) {
        return Err(GeometryError::NonFiniteSolution);
    }

    let residual_sum_of_squares = if rows == 2 {
        0.0
    } else {
        (&system.a * &solution - &system.b).norm_squared()
    };

    Ok(LeastSquaresSolution {
        point: PlanarPoint::new(solution[0], solution[1]),
        residual_sum_of_squares,
        rank,
        condition_number,
    })
}
