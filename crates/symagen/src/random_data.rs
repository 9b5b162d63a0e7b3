//! Generate random data for use in benchmarks and tests.

use rand::prelude::*;

/// Draw one standard normal value using the Box-Muller transform.
pub fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // `gen` is in [0, 1) so shift away from zero before taking the log.
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * core::f64::consts::PI * u2).cos()
}

/// Generate points from an axis-aligned Gaussian.
///
/// # Arguments:
///
/// * `cardinality`: number of points to generate.
/// * `means`: the mean along each axis.
/// * `std_devs`: the standard deviation along each axis.
/// * `rng`: random number generator.
///
/// # Panics
///
/// * If `means` and `std_devs` have different lengths.
#[must_use]
pub fn gaussian_tabular<R: Rng>(cardinality: usize, means: &[f64], std_devs: &[f64], rng: &mut R) -> Vec<Vec<f64>> {
    assert_eq!(means.len(), std_devs.len(), "One standard deviation is needed per axis.");
    (0..cardinality)
        .map(|_| {
            means
                .iter()
                .zip(std_devs)
                .map(|(&m, &s)| standard_normal(rng).mul_add(s, m))
                .collect()
        })
        .collect()
}

/// Generate points from a Gaussian with a linear correlation between the first two axes.
///
/// The second axis is `rho * x0 + sqrt(1 - rho^2) * e`, scaled by its standard deviation.
#[must_use]
pub fn correlated_gaussian<R: Rng>(cardinality: usize, dimensionality: usize, rho: f64, rng: &mut R) -> Vec<Vec<f64>> {
    let tail = (1.0 - rho * rho).sqrt();
    (0..cardinality)
        .map(|_| {
            let mut row = (0..dimensionality).map(|_| standard_normal(rng)).collect::<Vec<_>>();
            if dimensionality > 1 {
                row[1] = rho.mul_add(row[0], tail * row[1]);
            }
            row
        })
        .collect()
}
