//! Frequent itemset mining by recursive conditional FP-trees.

use std::collections::HashMap;

use super::{FpTree, ItemsetWithCount};
use crate::AttributeId;

/// Mines every itemset whose count reaches a minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct FpGrowth;

impl FpGrowth {
    /// Mine the itemsets that appear in at least `min_support` of `transactions`.
    ///
    /// # Arguments
    ///
    /// * `transactions`: sets of attribute ids.
    /// * `min_support`: fraction of transactions in `[0, 1]`.
    #[must_use]
    pub fn mine(transactions: &[Vec<AttributeId>], min_support: f64) -> Vec<ItemsetWithCount> {
        #[allow(clippy::cast_precision_loss)]
        let min_count = min_support * transactions.len() as f64;
        Self::mine_with_min_count(transactions, min_count)
    }

    /// Mine the itemsets that appear in at least `min_count` of `transactions`.
    #[must_use]
    pub fn mine_with_min_count(transactions: &[Vec<AttributeId>], min_count: f64) -> Vec<ItemsetWithCount> {
        let weighted = transactions.iter().map(|t| (t.clone(), 1.0)).collect::<Vec<_>>();
        Self::mine_weighted(&weighted, min_count)
    }

    /// Mine using precomputed single-item counts.
    ///
    /// Only items of `item_counts` whose count is at least `min_count` are
    /// admitted, which lets the caller prune items by criteria other than
    /// support before mining.
    #[must_use]
    pub fn mine_with_counts(
        transactions: &[Vec<AttributeId>],
        item_counts: &HashMap<AttributeId, f64>,
        min_count: f64,
    ) -> Vec<ItemsetWithCount> {
        let mut tree = FpTree::from_counts(item_counts, min_count);
        for t in transactions {
            tree.insert(t, 1.0);
        }
        Self::mine_tree(&tree, min_count)
    }

    /// Mine weighted transactions, e.g. decayed paths from a streaming tree.
    #[must_use]
    pub fn mine_weighted(transactions: &[(Vec<AttributeId>, f64)], min_count: f64) -> Vec<ItemsetWithCount> {
        let tree = FpTree::from_weighted(transactions, min_count);
        Self::mine_tree(&tree, min_count)
    }

    /// Mine an already built tree.
    #[must_use]
    pub fn mine_tree(tree: &FpTree, min_count: f64) -> Vec<ItemsetWithCount> {
        let mut itemsets = Vec::new();
        let mut suffix = Vec::new();
        mine_recursive(tree, min_count, &mut suffix, &mut itemsets);
        ftlog::trace!("Mined {} itemsets with minimum count {min_count}", itemsets.len());
        itemsets
    }
}

/// Emit every frequent extension of `suffix` found in `tree`.
fn mine_recursive(
    tree: &FpTree,
    min_count: f64,
    suffix: &mut Vec<AttributeId>,
    itemsets: &mut Vec<ItemsetWithCount>,
) {
    // Least frequent first, so each conditional tree only holds items ranked above.
    for &item in tree.order().iter().rev() {
        let count = tree.item_count(item);
        if count <= 0.0 || count < min_count {
            continue;
        }
        suffix.push(item);
        itemsets.push(ItemsetWithCount::new(suffix.clone(), count));

        let conditional = FpTree::from_weighted(&tree.prefix_paths(item), min_count);
        if !conditional.is_empty() {
            mine_recursive(&conditional, min_count, suffix, itemsets);
        }
        suffix.pop();
    }
}
