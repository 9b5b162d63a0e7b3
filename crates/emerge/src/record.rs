//! The records that are scored and explained.

use serde::{Deserialize, Serialize};

/// The id of one encoded categorical value, unique across all columns.
pub type AttributeId = u32;

/// One observation: a fixed-dimension metric vector and a set of attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// The numeric features.
    metrics: Vec<f64>,
    /// The attribute ids, sorted and without duplicates.
    attributes: Vec<AttributeId>,
}

impl MetricRecord {
    /// Create a new record. Duplicate attribute ids are removed.
    #[must_use]
    pub fn new(metrics: Vec<f64>, mut attributes: Vec<AttributeId>) -> Self {
        attributes.sort_unstable();
        attributes.dedup();
        Self { metrics, attributes }
    }

    /// The numeric features.
    #[must_use]
    pub fn metrics(&self) -> &[f64] {
        &self.metrics
    }

    /// The attribute ids in ascending order.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeId] {
        &self.attributes
    }

    /// The number of metrics.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.metrics.len()
    }
}

/// A record paired with the score a detector gave it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// The scored record.
    pub record: MetricRecord,
    /// Its anomaly score. Larger is more anomalous.
    pub score: f64,
}

impl ScoredRecord {
    /// Pair a record with its score.
    #[must_use]
    pub const fn new(record: MetricRecord, score: f64) -> Self {
        Self { record, score }
    }
}
