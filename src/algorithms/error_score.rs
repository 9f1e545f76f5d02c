//! Confidence metric derived from the least-squares residual

/// Convert a residual sum of squares into an average positional disagreement.
///
/// Two or fewer sightlines carry no redundancy, so the score is 0 by
/// convention. Otherwise the score is `sqrt(rss / n)` in planar units
/// (meters). Negative or non-finite residuals score 0.
pub fn score(residual_sum_of_squares: f64, observation_count: usize) -> f64 {
    if observation_count <= 2 || !(residual_sum_of_squares > 0.0) {
        return 0.0;
    }
    if residual_sum_of_squares.is_infinite() {
        return f64::INFINITY;
    }
    (residual_sum_of_squares / observation_count as f64).sqrt()
}
