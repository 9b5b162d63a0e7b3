//! The Minimum Covariance Determinant estimator, fitted with C-steps.

use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

use super::{
    linalg::{mahalanobis, mean_and_covariance, Lu},
    OutlierDetector,
};
use crate::{Error, MetricRecord, Result};

/// The default fraction of records trusted as inliers while fitting.
pub const DEFAULT_ALPHA: f64 = 0.5;

/// The default minimum decrease of the determinant between C-steps.
pub const DEFAULT_STOPPING_DELTA: f64 = 1e-3;

/// How many random seed subsets to draw before giving up on a singular start.
const MAX_SEED_ATTEMPTS: usize = 10;

/// A fitted location and scatter estimate.
#[derive(Debug, Clone)]
pub struct RobustModel {
    /// The robust mean.
    mean: Array1<f64>,
    /// The robust covariance.
    covariance: Array2<f64>,
    /// The inverse of `covariance`.
    inverse: Array2<f64>,
    /// The determinant of `covariance`.
    determinant: f64,
}

impl RobustModel {
    /// Fit the mean and covariance of the selected rows.
    ///
    /// # Errors
    ///
    /// * `NumericalInstability` if the covariance is singular.
    fn fit(data: &Array2<f64>, indices: &[usize]) -> Result<Self> {
        let (mean, covariance) = mean_and_covariance(data.view(), indices);
        let lu = Lu::factor(covariance.view())?;
        let determinant = lu.determinant();
        if determinant <= 0.0 || !determinant.is_finite() {
            return Err(Error::NumericalInstability(format!(
                "covariance determinant is {determinant}"
            )));
        }
        let inverse = lu.inverse()?;
        Ok(Self {
            mean,
            covariance,
            inverse,
            determinant,
        })
    }

    /// The Mahalanobis distance of `x` under this model.
    #[must_use]
    pub fn distance(&self, x: ArrayView1<f64>) -> f64 {
        mahalanobis(self.mean.view(), self.inverse.view(), x)
    }

    /// The robust mean.
    #[must_use]
    pub fn mean(&self) -> ArrayView1<f64> {
        self.mean.view()
    }

    /// The robust covariance.
    #[must_use]
    pub const fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// The determinant of the covariance.
    #[must_use]
    pub const fn determinant(&self) -> f64 {
        self.determinant
    }
}

/// A multivariate detector scoring records by Mahalanobis distance from a
/// Minimum Covariance Determinant estimate.
///
/// Training draws `p + 1` records at random as a seed, then repeatedly keeps
/// the `h = floor(alpha * (n + p + 1))` records closest to the current model
/// and refits on exactly those ("C-steps"). The determinant never increases
/// across C-steps. Fitting stops when it decreases by less than the stopping
/// delta, or when the next covariance would be singular, in which case the
/// last valid model is kept. That may be the seed model itself.
#[derive(Debug, Clone)]
pub struct MinCovDet {
    /// The number of metrics, `p`.
    dimension: usize,
    /// The fraction of records trusted as inliers while fitting.
    alpha: f64,
    /// Stop when the determinant decreases by less than this.
    stopping_delta: f64,
    /// The source of the random seed subsets.
    rng: StdRng,
    /// The fitted model, if training succeeded.
    model: Option<RobustModel>,
    /// The determinant after each accepted C-step of the last `train` call.
    determinants: Vec<f64>,
}

impl MinCovDet {
    /// Create an untrained detector for records with `dimension` metrics.
    ///
    /// A `seed` makes the choice of seed subsets reproducible.
    #[must_use]
    pub fn new(dimension: usize, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            dimension,
            alpha: DEFAULT_ALPHA,
            stopping_delta: DEFAULT_STOPPING_DELTA,
            rng,
            model: None,
            determinants: Vec::new(),
        }
    }

    /// Set the fraction of records trusted as inliers while fitting.
    #[must_use]
    pub const fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the minimum determinant decrease that keeps the C-steps going.
    #[must_use]
    pub const fn with_stopping_delta(mut self, stopping_delta: f64) -> Self {
        self.stopping_delta = stopping_delta;
        self
    }

    /// The fitted model, if any.
    #[must_use]
    pub const fn model(&self) -> Option<&RobustModel> {
        self.model.as_ref()
    }

    /// The determinant after each accepted C-step of the last `train` call.
    #[must_use]
    pub fn determinants(&self) -> &[f64] {
        &self.determinants
    }

    /// The number of records refitted in each C-step for `n` records.
    #[must_use]
    pub fn subset_size(&self, n: usize) -> usize {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let h = (self.alpha * (n + self.dimension + 1) as f64).floor() as usize;
        h.clamp(self.dimension + 1, n)
    }

    /// Copy the metrics of `sample` into an `n x p` matrix.
    fn to_matrix(&self, sample: &[MetricRecord]) -> Result<Array2<f64>> {
        let mut data = Array2::zeros((sample.len(), self.dimension));
        for (mut row, record) in data.rows_mut().into_iter().zip(sample) {
            if record.dimension() != self.dimension {
                return Err(Error::DimensionMismatch {
                    expected: self.dimension,
                    found: record.dimension(),
                });
            }
            row.assign(&ArrayView1::from(record.metrics()));
        }
        Ok(data)
    }

    /// Fit a model to a random subset of `p + 1` records, retrying singular draws.
    fn seed_model(&mut self, data: &Array2<f64>) -> Result<RobustModel> {
        let mut last_err = Error::NumericalInstability("no seed subset was drawn".to_string());
        for attempt in 1..=MAX_SEED_ATTEMPTS {
            let indices = rand::seq::index::sample(&mut self.rng, data.nrows(), self.dimension + 1).into_vec();
            match RobustModel::fit(data, &indices) {
                Ok(model) => return Ok(model),
                Err(e) => {
                    ftlog::trace!("Seed attempt {attempt} failed: {e}");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    /// The indices of the `h` rows closest to `model`.
    fn closest(data: &Array2<f64>, model: &RobustModel, h: usize) -> Vec<usize> {
        let mut distances = data
            .rows()
            .into_iter()
            .map(|row| model.distance(row))
            .enumerate()
            .collect::<Vec<_>>();
        distances.sort_by(|(_, a), (_, b)| a.total_cmp(b));
        distances.truncate(h);
        distances.into_iter().map(|(i, _)| i).collect()
    }

    /// Run C-steps from a random seed until the determinant stops decreasing.
    fn fit(&mut self, data: &Array2<f64>) -> Result<RobustModel> {
        let seed = self.seed_model(data)?;
        Ok(self.refine(data, seed))
    }

    /// Run C-steps from `seed` and return the last valid model.
    ///
    /// If the first refit is already singular, the seed itself is kept.
    fn refine(&mut self, data: &Array2<f64>, seed: RobustModel) -> RobustModel {
        let h = self.subset_size(data.nrows());

        // The first refit from the seed is the starting point of the monotone sequence.
        let mut current = match RobustModel::fit(data, &Self::closest(data, &seed, h)) {
            Ok(model) => model,
            Err(e) => {
                ftlog::trace!("Keeping the seed model; first refit is degenerate: {e}");
                self.determinants.push(seed.determinant);
                return seed;
            }
        };
        self.determinants.push(current.determinant);

        let mut step = 1;
        loop {
            let next = match RobustModel::fit(data, &Self::closest(data, &current, h)) {
                Ok(next) => next,
                Err(e) => {
                    ftlog::trace!("Iteration {step}: stopping on degenerate covariance: {e}");
                    break;
                }
            };

            let delta = current.determinant - next.determinant;
            if delta < 0.0 {
                ftlog::trace!("Iteration {step}: determinant increased by {}; keeping previous model", -delta);
                break;
            }

            ftlog::trace!("Iteration {step}: delta = {delta}; det = {}", next.determinant);
            self.determinants.push(next.determinant);
            current = next;

            if delta < self.stopping_delta {
                break;
            }
            step += 1;
        }

        ftlog::trace!("mean: {}", current.mean);
        ftlog::trace!("cov: {}", current.covariance);
        current
    }
}

impl OutlierDetector for MinCovDet {
    fn name(&self) -> &'static str {
        "mcd"
    }

    fn train(&mut self, sample: &[MetricRecord]) -> Result<()> {
        self.model = None;
        self.determinants.clear();

        if self.dimension == 0 {
            return Err(Error::DegenerateModel("records have no metrics".to_string()));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(Error::InvalidConfig(format!("alpha must be in (0, 1], got {}", self.alpha)));
        }
        if sample.len() <= self.dimension + 1 {
            return Err(Error::DegenerateModel(format!(
                "{} records cannot fit a {}-dimensional covariance",
                sample.len(),
                self.dimension
            )));
        }

        let data = self.to_matrix(sample)?;
        let model = self.fit(&data)?;
        ftlog::debug!(
            "Fitted MinCovDet on {} records in {} C-steps, det = {}",
            sample.len(),
            self.determinants.len(),
            model.determinant
        );
        self.model = Some(model);
        Ok(())
    }

    fn score(&self, record: &MetricRecord) -> Result<f64> {
        let model = self.model.as_ref().ok_or(Error::NotTrained)?;
        if record.dimension() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                found: record.dimension(),
            });
        }
        Ok(model.distance(ArrayView1::from(record.metrics())))
    }

    /// For normal data the squared Mahalanobis distance is chi-squared with
    /// `p` degrees of freedom. The z-score is mapped to its normal CDF, that
    /// probability to the chi-squared quantile, and the square root of the
    /// quantile is returned so that it is on the same scale as the scores.
    fn zscore_equivalent(&self, zscore: f64) -> Result<f64> {
        let normal = Normal::new(0.0, 1.0).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        #[allow(clippy::cast_precision_loss)]
        let chi_squared =
            ChiSquared::new(self.dimension as f64).map_err(|e| Error::InvalidConfig(e.to_string()))?;

        let cdf = normal.cdf(zscore);
        Ok(chi_squared.inverse_cdf(cdf).sqrt())
    }
}
