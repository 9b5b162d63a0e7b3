//! The SpaceSaving heavy-hitters sketch.
//!
//! At most `capacity` items are tracked. When a new item arrives and the
//! sketch is full, the item with the smallest count `m` is evicted and the
//! newcomer inherits `m` as both its starting count and its error. A reported
//! count therefore never underestimates the true count of a tracked item and
//! overestimates it by at most its recorded error, which is bounded by the
//! smallest count at the time of eviction.

use std::collections::HashMap;

use super::ApproximateCount;
use crate::AttributeId;

/// One tracked item.
#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    /// The estimated count.
    count: f64,
    /// The count inherited from the evicted item.
    error: f64,
}

/// A fixed-capacity approximate counter.
#[derive(Debug, Clone)]
pub struct SpaceSaving {
    /// The tracked items.
    slots: HashMap<AttributeId, Slot>,
    /// The maximum number of tracked items.
    capacity: usize,
    /// The sum of all observed weights, decayed.
    total: f64,
}

impl SpaceSaving {
    /// An empty sketch tracking at most `capacity` items.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: HashMap::with_capacity(capacity),
            capacity,
            total: 0.0,
        }
    }

    /// The maximum number of tracked items.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The overestimation bound of `item`. Zero if it is not tracked.
    #[must_use]
    pub fn error(&self, item: AttributeId) -> f64 {
        self.slots.get(&item).map_or(0.0, |s| s.error)
    }

    /// A lower bound on the true count of `item`.
    #[must_use]
    pub fn lower_bound(&self, item: AttributeId) -> f64 {
        self.slots.get(&item).map_or(0.0, |s| s.count - s.error)
    }

    /// The tracked item with the smallest count, ties broken by id.
    fn min_slot(&self) -> Option<(AttributeId, Slot)> {
        self.slots
            .iter()
            .min_by(|(ia, a), (ib, b)| a.count.total_cmp(&b.count).then(ia.cmp(ib)))
            .map(|(&i, &s)| (i, s))
    }
}

impl ApproximateCount for SpaceSaving {
    fn observe_weighted(&mut self, item: AttributeId, weight: f64) {
        self.total += weight;

        if let Some(slot) = self.slots.get_mut(&item) {
            slot.count += weight;
        } else if self.slots.len() < self.capacity {
            self.slots.insert(item, Slot { count: weight, error: 0.0 });
        } else if let Some((evicted, min)) = self.min_slot() {
            self.slots.remove(&evicted);
            self.slots.insert(
                item,
                Slot {
                    count: min.count + weight,
                    error: min.count,
                },
            );
        }
    }

    fn count(&self, item: AttributeId) -> f64 {
        self.slots.get(&item).map_or(0.0, |s| s.count)
    }

    fn counts(&self) -> HashMap<AttributeId, f64> {
        self.slots.iter().map(|(&i, s)| (i, s.count)).collect()
    }

    fn total_count(&self) -> f64 {
        self.total
    }

    fn multiply_all_counts(&mut self, factor: f64) {
        for slot in self.slots.values_mut() {
            slot.count *= factor;
            slot.error *= factor;
        }
        self.total *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_below_capacity() {
        let mut ss = SpaceSaving::new(10);
        ss.observe(&[1, 1, 1, 2, 3, 1, 3, 2, 3]);

        assert_eq!(ss.count(1), 4.0);
        assert_eq!(ss.count(2), 2.0);
        assert_eq!(ss.count(3), 3.0);
        assert_eq!(ss.error(1), 0.0);
    }

    #[test]
    fn overflow_inherits_minimum() {
        let mut ss = SpaceSaving::new(10);
        for i in 0..10 {
            ss.observe(&[i]);
            assert_eq!(ss.count(i), 1.0);
        }

        ss.observe(&[10]);
        assert_eq!(ss.count(10), 2.0);
        assert_eq!(ss.error(10), 1.0);
        assert_eq!(ss.lower_bound(10), 1.0);
        assert_eq!(ss.counts().len(), 10);
        assert_eq!(ss.total_count(), 11.0);
    }

    #[test]
    fn counts_bound_the_truth() {
        let mut ss = SpaceSaving::new(4);
        let stream = [1, 2, 3, 4, 5, 1, 1, 6, 1, 2, 7, 1];
        ss.observe(&stream);

        let true_count = stream.iter().filter(|&&i| i == 1).count() as f64;
        assert!(ss.count(1) >= true_count);
        assert!(ss.lower_bound(1) <= true_count);
        assert!(ss.count(1) - true_count <= ss.error(1));
    }
}
