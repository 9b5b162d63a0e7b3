//! The partition of a scored dataset into inliers and outliers.

use serde::{Deserialize, Serialize};

use crate::{utils::descending, ScoredRecord};

/// Inliers and outliers of one classified batch, each in descending order of score.
///
/// Every classified record appears exactly once across the two lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// The records that were not flagged.
    inliers: Vec<ScoredRecord>,
    /// The flagged records.
    outliers: Vec<ScoredRecord>,
}

impl BatchResult {
    /// Create a batch from already partitioned records.
    ///
    /// Both lists are sorted by descending score.
    #[must_use]
    pub fn new(mut inliers: Vec<ScoredRecord>, mut outliers: Vec<ScoredRecord>) -> Self {
        descending(&mut inliers, |s| s.score);
        descending(&mut outliers, |s| s.score);
        Self { inliers, outliers }
    }

    /// Sort by score and cut so that `floor(n * percentile)` records are inliers.
    pub(crate) fn split_at_percentile(mut scored: Vec<ScoredRecord>, percentile: f64) -> Self {
        descending(&mut scored, |s| s.score);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let num_inliers = ((scored.len() as f64) * percentile).floor() as usize;
        let num_outliers = scored.len() - num_inliers.min(scored.len());

        let inliers = scored.split_off(num_outliers);
        Self {
            inliers,
            outliers: scored,
        }
    }

    /// Flag every record whose score is strictly greater than `threshold`.
    pub(crate) fn split_above(scored: Vec<ScoredRecord>, threshold: f64) -> Self {
        let (outliers, inliers) = scored.into_iter().partition(|s| s.score > threshold);
        Self::new(inliers, outliers)
    }

    /// The records that were not flagged.
    #[must_use]
    pub fn inliers(&self) -> &[ScoredRecord] {
        &self.inliers
    }

    /// The flagged records.
    #[must_use]
    pub fn outliers(&self) -> &[ScoredRecord] {
        &self.outliers
    }

    /// The number of inliers.
    #[must_use]
    pub fn num_inliers(&self) -> usize {
        self.inliers.len()
    }

    /// The number of outliers.
    #[must_use]
    pub fn num_outliers(&self) -> usize {
        self.outliers.len()
    }

    /// The total number of classified records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inliers.len() + self.outliers.len()
    }

    /// Whether the batch holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the batch and return `(inliers, outliers)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<ScoredRecord>, Vec<ScoredRecord>) {
        (self.inliers, self.outliers)
    }
}
