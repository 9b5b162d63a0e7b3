//! Settings for batch and streaming analysis.

use serde::{Deserialize, Serialize};

use crate::{count::CounterKind, outlier::DetectorKind, Error, Result};

/// How records are split into inliers and outliers after scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// Flag the records above this percentile of scores, e.g. 0.99 flags the top 1%.
    Percentile(f64),
    /// Flag the records scoring above the detector's equivalent of this z-score.
    ZScore(f64),
}

impl Default for Threshold {
    fn default() -> Self {
        Self::Percentile(0.99)
    }
}

/// Settings for the streaming analyzer and its decaying miner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// The fraction of weight forgotten at each period boundary, in `[0, 1)`.
    pub decay_rate: f64,
    /// The number of records between period boundaries.
    pub period_length: usize,
    /// The number of records used to fit the detector before streaming starts.
    pub warmup: usize,
    /// The counter for inlier attributes.
    pub inlier_summary: CounterKind,
    /// The counter for outlier attributes.
    pub outlier_summary: CounterKind,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            decay_rate: 0.01,
            period_length: 100_000,
            warmup: 10_000,
            inlier_summary: CounterKind::SpaceSaving { capacity: 1000 },
            outlier_summary: CounterKind::SpaceSaving { capacity: 1000 },
        }
    }
}

/// Settings for one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// How to split scored records.
    pub threshold: Threshold,
    /// The fraction of outliers an explanation must cover.
    pub min_support: f64,
    /// How many times more frequent among outliers than among inliers an
    /// explanation must be.
    pub min_ratio: f64,
    /// The detector to use. `None` picks one from the number of metrics.
    pub detector: Option<DetectorKind>,
    /// Seed for the randomized detectors.
    pub seed: Option<u64>,
    /// Wall-clock budget for mining explanations, in milliseconds.
    pub summarize_timeout_ms: Option<u64>,
    /// Settings for streaming analysis.
    pub streaming: StreamingConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            min_support: 0.001,
            min_ratio: 3.0,
            detector: None,
            seed: None,
            summarize_timeout_ms: None,
            streaming: StreamingConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// The detector for records with `dimension` metrics.
    #[must_use]
    pub fn detector_for(&self, dimension: usize) -> DetectorKind {
        self.detector.unwrap_or_else(|| DetectorKind::for_dimension(dimension))
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` naming the first offending value.
    pub fn validate(&self) -> Result<()> {
        match self.threshold {
            Threshold::Percentile(p) if !(p > 0.0 && p < 1.0) => {
                return Err(invalid(format!("percentile must be in (0, 1), got {p}")));
            }
            Threshold::ZScore(z) if !z.is_finite() => {
                return Err(invalid(format!("z-score must be finite, got {z}")));
            }
            _ => (),
        }
        if !(0.0..=1.0).contains(&self.min_support) {
            return Err(invalid(format!("min_support must be in [0, 1], got {}", self.min_support)));
        }
        if !(self.min_ratio >= 0.0) {
            return Err(invalid(format!("min_ratio must be non-negative, got {}", self.min_ratio)));
        }
        if let Some(DetectorKind::MinCovDet { alpha, stopping_delta }) = self.detector {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(invalid(format!("alpha must be in (0, 1], got {alpha}")));
            }
            if !(stopping_delta >= 0.0) {
                return Err(invalid(format!("stopping_delta must be non-negative, got {stopping_delta}")));
            }
        }

        let streaming = &self.streaming;
        if !(0.0..1.0).contains(&streaming.decay_rate) {
            return Err(invalid(format!("decay_rate must be in [0, 1), got {}", streaming.decay_rate)));
        }
        if streaming.period_length == 0 {
            return Err(invalid("period_length must be positive".to_string()));
        }
        if streaming.warmup == 0 {
            return Err(invalid("warmup must be positive".to_string()));
        }
        for summary in [streaming.inlier_summary, streaming.outlier_summary] {
            match summary {
                CounterKind::SpaceSaving { capacity: 0 } => {
                    return Err(invalid("space saving capacity must be positive".to_string()));
                }
                CounterKind::Thresholded { floor } if !(floor >= 0.0) => {
                    return Err(invalid(format!("counter floor must be non-negative, got {floor}")));
                }
                _ => (),
            }
        }
        Ok(())
    }
}

/// Shorthand for an `InvalidConfig` error.
fn invalid(message: String) -> Error {
    Error::InvalidConfig(message)
}
