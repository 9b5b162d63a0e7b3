//! Per-attribute occurrence counters, exact or approximate, with decay.

mod exact;
mod space_saving;
mod thresholded;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use exact::ExactCount;
pub use space_saving::SpaceSaving;
pub use thresholded::ThresholdedCount;

use crate::AttributeId;

/// The capability shared by all attribute counters.
pub trait ApproximateCount {
    /// Add `weight` occurrences of `item`.
    fn observe_weighted(&mut self, item: AttributeId, weight: f64);

    /// Add one occurrence of each of `items`.
    fn observe(&mut self, items: &[AttributeId]) {
        for &item in items {
            self.observe_weighted(item, 1.0);
        }
    }

    /// The (estimated) count of `item`. Zero if it is not tracked.
    fn count(&self, item: AttributeId) -> f64;

    /// The (estimated) counts of every tracked item.
    fn counts(&self) -> HashMap<AttributeId, f64>;

    /// The total weight observed, after decay.
    fn total_count(&self) -> f64;

    /// Multiply every count, and the total, by `factor`.
    fn multiply_all_counts(&mut self, factor: f64);
}

/// Which counter to build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CounterKind {
    /// Exact counts with unbounded memory.
    Exact,
    /// Exact counts, forgetting items whose decayed count falls below `floor`.
    Thresholded {
        /// The smallest count retained after decay.
        floor: f64,
    },
    /// A SpaceSaving sketch tracking at most `capacity` items.
    SpaceSaving {
        /// The maximum number of tracked items.
        capacity: usize,
    },
}

impl CounterKind {
    /// Build an empty counter of this kind.
    #[must_use]
    pub fn build(self) -> Counter {
        match self {
            Self::Exact => Counter::Exact(ExactCount::default()),
            Self::Thresholded { floor } => Counter::Thresholded(ThresholdedCount::new(floor)),
            Self::SpaceSaving { capacity } => Counter::SpaceSaving(SpaceSaving::new(capacity)),
        }
    }
}

/// The closed set of counters.
#[derive(Debug, Clone)]
pub enum Counter {
    /// See [`ExactCount`].
    Exact(ExactCount),
    /// See [`ThresholdedCount`].
    Thresholded(ThresholdedCount),
    /// See [`SpaceSaving`].
    SpaceSaving(SpaceSaving),
}

impl ApproximateCount for Counter {
    fn observe_weighted(&mut self, item: AttributeId, weight: f64) {
        match self {
            Self::Exact(c) => c.observe_weighted(item, weight),
            Self::Thresholded(c) => c.observe_weighted(item, weight),
            Self::SpaceSaving(c) => c.observe_weighted(item, weight),
        }
    }

    fn count(&self, item: AttributeId) -> f64 {
        match self {
            Self::Exact(c) => c.count(item),
            Self::Thresholded(c) => c.count(item),
            Self::SpaceSaving(c) => c.count(item),
        }
    }

    fn counts(&self) -> HashMap<AttributeId, f64> {
        match self {
            Self::Exact(c) => c.counts(),
            Self::Thresholded(c) => c.counts(),
            Self::SpaceSaving(c) => c.counts(),
        }
    }

    fn total_count(&self) -> f64 {
        match self {
            Self::Exact(c) => c.total_count(),
            Self::Thresholded(c) => c.total_count(),
            Self::SpaceSaving(c) => c.total_count(),
        }
    }

    fn multiply_all_counts(&mut self, factor: f64) {
        match self {
            Self::Exact(c) => c.multiply_all_counts(factor),
            Self::Thresholded(c) => c.multiply_all_counts(factor),
            Self::SpaceSaving(c) => c.multiply_all_counts(factor),
        }
    }
}
