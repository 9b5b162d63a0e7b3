//! Gaussian data with injected outliers and planted categorical attributes.
//!
//! The generated rows are plain vectors so that any detector or miner can
//! wrap them in its own record type.

use core::ops::Range;

use rand::prelude::*;

use crate::random_data::{correlated_gaussian, gaussian_tabular};

/// Rows of metrics with attribute ids and ground-truth outlier labels.
#[derive(Debug, Clone, Default)]
pub struct Contaminated {
    /// The metric vector of each row.
    pub metrics: Vec<Vec<f64>>,
    /// The attribute ids of each row.
    pub attributes: Vec<Vec<u32>>,
    /// Whether each row was generated as an outlier.
    pub is_outlier: Vec<bool>,
}

impl Contaminated {
    /// Generate `num_inliers` standard normal rows followed by `num_outliers`
    /// rows from a unit Gaussian whose mean is `shift` along every axis.
    #[must_use]
    pub fn gaussian(num_inliers: usize, num_outliers: usize, dimensionality: usize, shift: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let ones = vec![1.0; dimensionality];

        let mut metrics = gaussian_tabular(num_inliers, &vec![0.0; dimensionality], &ones, &mut rng);
        metrics.extend(gaussian_tabular(
            num_outliers,
            &vec![shift; dimensionality],
            &ones,
            &mut rng,
        ));

        let is_outlier = (0..num_inliers + num_outliers).map(|i| i >= num_inliers).collect();
        let attributes = vec![Vec::new(); num_inliers + num_outliers];

        Self {
            metrics,
            attributes,
            is_outlier,
        }
    }

    /// Generate `num_inliers` standard normal rows whose first two axes have
    /// correlation `rho`, followed by `num_outliers` rows that break it.
    ///
    /// The outliers sit at `(t, -t)` or `(-t, t)` on the first two axes with
    /// `t` in `[1.5, 2.5)`, so no single axis marks them as unusual. The other
    /// axes are standard normal.
    ///
    /// # Panics
    ///
    /// * If `dimensionality` is less than 2.
    #[must_use]
    pub fn correlated(num_inliers: usize, num_outliers: usize, dimensionality: usize, rho: f64, seed: u64) -> Self {
        assert!(dimensionality >= 2, "Correlation needs at least two axes.");
        let mut rng = StdRng::seed_from_u64(seed);

        let mut metrics = correlated_gaussian(num_inliers, dimensionality, rho, &mut rng);
        metrics.extend(
            gaussian_tabular(num_outliers, &vec![0.0; dimensionality], &vec![1.0; dimensionality], &mut rng)
                .into_iter()
                .map(|mut row| {
                    let t = rng.gen_range(1.5..2.5);
                    let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                    row[0] = sign * t;
                    row[1] = -sign * t;
                    row
                }),
        );

        let is_outlier = (0..num_inliers + num_outliers).map(|i| i >= num_inliers).collect();
        let attributes = vec![Vec::new(); num_inliers + num_outliers];

        Self {
            metrics,
            attributes,
            is_outlier,
        }
    }

    /// The number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Indices of the rows generated as outliers.
    #[must_use]
    pub fn outlier_indices(&self) -> Vec<usize> {
        self.population(true)
    }

    /// Indices of the rows generated as inliers.
    #[must_use]
    pub fn inlier_indices(&self) -> Vec<usize> {
        self.population(false)
    }

    /// Indices of rows whose label equals `outlier`.
    fn population(&self, outlier: bool) -> Vec<usize> {
        self.is_outlier
            .iter()
            .enumerate()
            .filter(|&(_, &o)| o == outlier)
            .map(|(i, _)| i)
            .collect()
    }

    /// Plant `attribute` into exactly `num_outliers` outlier rows and
    /// `num_inliers` inlier rows, chosen uniformly without replacement.
    ///
    /// Counts larger than a population are clamped to its size.
    pub fn plant<R: Rng>(&mut self, attribute: u32, num_outliers: usize, num_inliers: usize, rng: &mut R) {
        for (population, amount) in [(self.outlier_indices(), num_outliers), (self.inlier_indices(), num_inliers)] {
            let amount = amount.min(population.len());
            for i in rand::seq::index::sample(rng, population.len(), amount) {
                let row = &mut self.attributes[population[i]];
                if !row.contains(&attribute) {
                    row.push(attribute);
                }
            }
        }
    }

    /// Give every row `per_row` distinct attributes drawn uniformly from `pool`.
    ///
    /// # Panics
    ///
    /// * If `pool` has fewer than `per_row` ids.
    pub fn background<R: Rng>(&mut self, pool: Range<u32>, per_row: usize, rng: &mut R) {
        let ids = pool.collect::<Vec<_>>();
        assert!(ids.len() >= per_row, "The pool must hold at least `per_row` ids.");
        for row in &mut self.attributes {
            for &id in ids.choose_multiple(rng, per_row) {
                if !row.contains(&id) {
                    row.push(id);
                }
            }
        }
    }
}
