//! Outlier detectors that score records and split them into inliers and outliers.

mod batch;
mod linalg;
mod mad;
mod mcd;
mod zscore;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use batch::BatchResult;
pub use linalg::{mahalanobis, mean_and_covariance, Lu};
pub use mad::Mad;
pub use mcd::{MinCovDet, RobustModel};
pub use zscore::ZScore;

use crate::{Error, MetricRecord, Result, ScoredRecord};

/// The capability shared by all outlier detectors.
///
/// A detector is fitted once with `train` and then scores arbitrary records.
/// Larger scores are more anomalous.
pub trait OutlierDetector: Sync {
    /// A short name for logs.
    fn name(&self) -> &'static str;

    /// Fit the model to a sample of records, replacing any previous model.
    ///
    /// # Errors
    ///
    /// * `DegenerateModel` if the sample cannot support the model.
    /// * `NumericalInstability` if a matrix could not be inverted.
    /// * `DimensionMismatch` if a record has the wrong number of metrics.
    fn train(&mut self, sample: &[MetricRecord]) -> Result<()>;

    /// Score one record with the fitted model.
    ///
    /// # Errors
    ///
    /// * `NotTrained` if there is no valid model.
    /// * `DimensionMismatch` if the record has the wrong number of metrics.
    fn score(&self, record: &MetricRecord) -> Result<f64>;

    /// Map a standard-normal z-score onto this detector's score scale.
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` if `zscore` cannot be mapped.
    fn zscore_equivalent(&self, zscore: f64) -> Result<f64>;

    /// Score every record with the fitted model, in parallel.
    ///
    /// # Errors
    ///
    /// See [`OutlierDetector::score`].
    fn score_all(&self, data: Vec<MetricRecord>) -> Result<Vec<ScoredRecord>> {
        data.into_par_iter()
            .map(|record| self.score(&record).map(|score| ScoredRecord::new(record, score)))
            .collect()
    }

    /// Score `data` and keep the records above the `percentile` of scores as outliers.
    ///
    /// A percentile of 0.75 keeps the top 25% as outliers.
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` if `percentile` is not in `[0, 1]`.
    /// * Any error from [`OutlierDetector::score`].
    fn classify_by_percentile(&self, data: Vec<MetricRecord>, percentile: f64) -> Result<BatchResult> {
        if !(0.0..=1.0).contains(&percentile) {
            return Err(Error::InvalidConfig(format!(
                "percentile must be in [0, 1], got {percentile}"
            )));
        }
        let scored = self.score_all(data)?;
        Ok(BatchResult::split_at_percentile(scored, percentile))
    }

    /// Score `data` and keep every record whose score exceeds
    /// `zscore_equivalent(zscore)` as an outlier.
    ///
    /// # Errors
    ///
    /// * Any error from [`OutlierDetector::zscore_equivalent`] or [`OutlierDetector::score`].
    fn classify_by_zscore_equivalent(&self, data: Vec<MetricRecord>, zscore: f64) -> Result<BatchResult> {
        let threshold = self.zscore_equivalent(zscore)?;
        let scored = self.score_all(data)?;
        Ok(BatchResult::split_above(scored, threshold))
    }
}

/// Which detector to build, with its tunable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectorKind {
    /// Median absolute deviation over one metric.
    Mad,
    /// Mean and standard deviation over one metric.
    ZScore,
    /// Minimum Covariance Determinant over several metrics.
    MinCovDet {
        /// The fraction of records trusted as inliers while fitting.
        alpha: f64,
        /// Stop when the determinant decreases by less than this.
        stopping_delta: f64,
    },
}

impl DetectorKind {
    /// The default detector for records with `dimension` metrics.
    #[must_use]
    pub const fn for_dimension(dimension: usize) -> Self {
        if dimension > 1 {
            Self::MinCovDet {
                alpha: mcd::DEFAULT_ALPHA,
                stopping_delta: mcd::DEFAULT_STOPPING_DELTA,
            }
        } else {
            Self::Mad
        }
    }
}

/// The closed set of detectors.
#[derive(Debug, Clone)]
pub enum Detector {
    /// See [`ZScore`].
    ZScore(ZScore),
    /// See [`Mad`].
    Mad(Mad),
    /// See [`MinCovDet`].
    MinCovDet(MinCovDet),
}

impl Detector {
    /// An untrained z-score detector.
    #[must_use]
    pub fn zscore() -> Self {
        Self::ZScore(ZScore::default())
    }

    /// An untrained MAD detector.
    #[must_use]
    pub fn mad() -> Self {
        Self::Mad(Mad::default())
    }

    /// An untrained MinCovDet detector with default parameters.
    #[must_use]
    pub fn min_cov_det(dimension: usize, seed: Option<u64>) -> Self {
        Self::MinCovDet(MinCovDet::new(dimension, seed))
    }

    /// Build the detector described by `kind` for records with `dimension` metrics.
    #[must_use]
    pub fn from_kind(kind: DetectorKind, dimension: usize, seed: Option<u64>) -> Self {
        match kind {
            DetectorKind::Mad => Self::mad(),
            DetectorKind::ZScore => Self::zscore(),
            DetectorKind::MinCovDet { alpha, stopping_delta } => Self::MinCovDet(
                MinCovDet::new(dimension, seed)
                    .with_alpha(alpha)
                    .with_stopping_delta(stopping_delta),
            ),
        }
    }
}

impl OutlierDetector for Detector {
    fn name(&self) -> &'static str {
        match self {
            Self::ZScore(d) => d.name(),
            Self::Mad(d) => d.name(),
            Self::MinCovDet(d) => d.name(),
        }
    }

    fn train(&mut self, sample: &[MetricRecord]) -> Result<()> {
        match self {
            Self::ZScore(d) => d.train(sample),
            Self::Mad(d) => d.train(sample),
            Self::MinCovDet(d) => d.train(sample),
        }
    }

    fn score(&self, record: &MetricRecord) -> Result<f64> {
        match self {
            Self::ZScore(d) => d.score(record),
            Self::Mad(d) => d.score(record),
            Self::MinCovDet(d) => d.score(record),
        }
    }

    fn zscore_equivalent(&self, zscore: f64) -> Result<f64> {
        match self {
            Self::ZScore(d) => d.zscore_equivalent(zscore),
            Self::Mad(d) => d.zscore_equivalent(zscore),
            Self::MinCovDet(d) => d.zscore_equivalent(zscore),
        }
    }
}

/// Read the single metric of a univariate record.
fn univariate(record: &MetricRecord) -> Result<f64> {
    match record.metrics() {
        &[x] => Ok(x),
        m => Err(Error::DimensionMismatch {
            expected: 1,
            found: m.len(),
        }),
    }
}
