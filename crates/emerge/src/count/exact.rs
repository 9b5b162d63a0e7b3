//! Exact counts with unbounded memory.

use std::collections::HashMap;

use super::ApproximateCount;
use crate::{AttributeId, MetricRecord};

/// Counts every observed item exactly.
#[derive(Debug, Clone, Default)]
pub struct ExactCount {
    /// The count of each item.
    counts: HashMap<AttributeId, f64>,
    /// The sum of all observed weights.
    total: f64,
}

impl ExactCount {
    /// Count the attributes of every record.
    pub fn from_records<'a, I: IntoIterator<Item = &'a MetricRecord>>(records: I) -> Self {
        let mut counter = Self::default();
        for record in records {
            counter.observe(record.attributes());
        }
        counter
    }
}

impl ApproximateCount for ExactCount {
    fn observe_weighted(&mut self, item: AttributeId, weight: f64) {
        *self.counts.entry(item).or_default() += weight;
        self.total += weight;
    }

    fn count(&self, item: AttributeId) -> f64 {
        self.counts.get(&item).copied().unwrap_or_default()
    }

    fn counts(&self) -> HashMap<AttributeId, f64> {
        self.counts.clone()
    }

    fn total_count(&self) -> f64 {
        self.total
    }

    fn multiply_all_counts(&mut self, factor: f64) {
        self.counts.values_mut().for_each(|c| *c *= factor);
        self.total *= factor;
    }
}
