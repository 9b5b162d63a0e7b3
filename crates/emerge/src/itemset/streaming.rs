//! An FP-tree maintained over a stream, with periodic decay and re-ranking.

use std::collections::HashMap;

use super::{FpGrowth, FpTree, ItemsetWithCount};
use crate::AttributeId;

/// A single FP-tree updated one transaction at a time.
///
/// Until the first call to [`decay_and_reset_frequent_items`](Self::decay_and_reset_frequent_items)
/// every item is admitted, ranked by first arrival. After that only items in
/// the most recent frequent set are inserted, and the rest are dropped.
#[derive(Debug, Clone)]
pub struct StreamingFpGrowth {
    /// The tree over the current working set of items.
    tree: FpTree,
    /// The fraction of transaction weight an itemset needs to be reported.
    min_support: f64,
    /// The decayed number of transactions seen.
    total_weight: f64,
    /// Whether a frequent item set has been installed.
    has_working_set: bool,
}

impl StreamingFpGrowth {
    /// An empty tree reporting itemsets with at least `min_support` of the weight.
    #[must_use]
    pub fn new(min_support: f64) -> Self {
        Self {
            tree: FpTree::default(),
            min_support,
            total_weight: 0.0,
            has_working_set: false,
        }
    }

    /// Insert one transaction with unit weight.
    pub fn insert_transaction(&mut self, items: &[AttributeId]) {
        if !self.has_working_set {
            let mut fresh = items.iter().filter(|&&i| self.tree.rank_of(i).is_none()).copied().collect::<Vec<_>>();
            fresh.sort_unstable();
            for item in fresh {
                self.tree.admit(item);
            }
        }
        self.tree.insert(items, 1.0);
        self.total_weight += 1.0;
    }

    /// Decay every stored transaction by `1 - decay_rate` and rebuild the tree
    /// over `frequent`, ranked by descending count and then ascending id.
    ///
    /// Stored paths are filtered to the new working set. Items outside it are
    /// forgotten until they become frequent again.
    pub fn decay_and_reset_frequent_items(&mut self, frequent: &HashMap<AttributeId, f64>, decay_rate: f64) {
        let factor = 1.0 - decay_rate;
        let paths = self.tree.weighted_paths();

        let mut tree = FpTree::from_counts(frequent, f64::NEG_INFINITY);
        for (path, weight) in paths {
            tree.insert(&path, weight * factor);
        }
        ftlog::debug!(
            "Rebuilt streaming tree: {} items, {} -> {} nodes",
            tree.order().len(),
            self.tree.num_nodes(),
            tree.num_nodes()
        );

        self.tree = tree;
        self.total_weight *= factor;
        self.has_working_set = true;
    }

    /// The itemsets whose weight is at least `min_support` of the total.
    #[must_use]
    pub fn itemsets(&self) -> Vec<ItemsetWithCount> {
        FpGrowth::mine_tree(&self.tree, self.min_support * self.total_weight)
    }

    /// The weight of each of `itemsets` in this tree, in the same order.
    #[must_use]
    pub fn counts_of(&self, itemsets: &[ItemsetWithCount]) -> Vec<ItemsetWithCount> {
        itemsets
            .iter()
            .map(|i| ItemsetWithCount::new(i.items().to_vec(), self.tree.support_of(i.items())))
            .collect()
    }

    /// The decayed number of transactions seen.
    #[must_use]
    pub const fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// The underlying tree.
    #[must_use]
    pub const fn tree(&self) -> &FpTree {
        &self.tree
    }

    /// Forget everything, including the working set.
    pub fn reset(&mut self) {
        *self = Self::new(self.min_support);
    }
}
