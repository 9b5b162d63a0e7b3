//! Exact counts that forget rare items when decayed.

use std::collections::HashMap;

use super::ApproximateCount;
use crate::AttributeId;

/// Counts items exactly between decays, and drops any item whose count falls
/// below `floor` after a decay.
///
/// Memory is bounded by the number of items above the floor, at the cost of
/// undercounting rare items that later become common. The total is always the
/// sum of the retained counts.
#[derive(Debug, Clone)]
pub struct ThresholdedCount {
    /// The count of each retained item.
    counts: HashMap<AttributeId, f64>,
    /// The sum of the retained counts.
    total: f64,
    /// The smallest count retained after a decay.
    floor: f64,
}

impl ThresholdedCount {
    /// An empty counter with the given retention floor.
    #[must_use]
    pub fn new(floor: f64) -> Self {
        Self {
            counts: HashMap::new(),
            total: 0.0,
            floor,
        }
    }

    /// The smallest count retained after a decay.
    #[must_use]
    pub const fn floor(&self) -> f64 {
        self.floor
    }

    /// The number of retained items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no items are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl ApproximateCount for ThresholdedCount {
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
        self.total *= factor;
        let (floor, total) = (self.floor, &mut self.total);
        self.counts.retain(|_, c| {
            *c *= factor;
            if *c < floor {
                *total -= *c;
            }
            *c >= floor
        });
        if self.counts.is_empty() {
            self.total = 0.0;
        }
    }
}
