//! Frequent and emerging itemset mining over record attributes.
//!
//! An *itemset* is a set of attribute ids. It is *emerging* when it is at
//! least `min_support` of the outliers and its frequency among outliers is at
//! least `min_ratio` times its frequency among inliers.

mod decaying;
mod emerging;
mod fp_growth;
mod fp_tree;
mod streaming;

use serde::{Deserialize, Serialize};

pub use decaying::DecayingEmergingItemsets;
pub use emerging::FpGrowthEmerging;
pub use fp_growth::FpGrowth;
pub use fp_tree::FpTree;
pub use streaming::StreamingFpGrowth;

use crate::{AttributeDecoder, AttributeId, ColumnValue};

/// An itemset with its (possibly decayed or estimated) count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsetWithCount {
    /// The attribute ids in ascending order.
    items: Vec<AttributeId>,
    /// The number of transactions containing every item.
    count: f64,
}

impl ItemsetWithCount {
    /// Create an itemset. The items are sorted and deduplicated.
    #[must_use]
    pub fn new(mut items: Vec<AttributeId>, count: f64) -> Self {
        items.sort_unstable();
        items.dedup();
        Self { items, count }
    }

    /// The attribute ids in ascending order.
    #[must_use]
    pub fn items(&self) -> &[AttributeId] {
        &self.items
    }

    /// The count.
    #[must_use]
    pub const fn count(&self) -> f64 {
        self.count
    }

    /// The number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the itemset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether every item of `self` is in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.items.iter().all(|i| other.items.binary_search(i).is_ok())
    }
}

/// One explanation: an emerging itemset with its support, count and ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsetResult {
    /// The fraction of outliers that contain the itemset.
    pub support: f64,
    /// The number of outliers that contain the itemset.
    pub count: f64,
    /// Outlier frequency over inlier frequency. Infinite if no inlier has it.
    pub ratio: f64,
    /// The attribute ids in ascending order.
    attributes: Vec<AttributeId>,
    /// The decoded labels of `attributes`, in the same order.
    pub items: Vec<ColumnValue>,
}

impl ItemsetResult {
    /// Build a result, decoding the itemset's attributes for display.
    pub fn new<D: AttributeDecoder + ?Sized>(
        itemset: &ItemsetWithCount,
        outlier_total: f64,
        ratio: f64,
        decoder: &D,
    ) -> Self {
        Self {
            support: itemset.count / outlier_total,
            count: itemset.count,
            ratio,
            attributes: itemset.items.clone(),
            items: decoder.decode_all(&itemset.items),
        }
    }

    /// The attribute ids in ascending order.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeId] {
        &self.attributes
    }
}

/// Outlier frequency over inlier frequency, or infinity if the inlier count is zero.
#[must_use]
pub fn frequency_ratio(outlier_count: f64, outlier_total: f64, inlier_count: f64, inlier_total: f64) -> f64 {
    if inlier_count > 0.0 && inlier_total > 0.0 {
        (outlier_count / outlier_total) / (inlier_count / inlier_total)
    } else {
        f64::INFINITY
    }
}

/// Sort by descending count, then descending size, then ascending items.
fn rank_order(a: &ItemsetWithCount, b: &ItemsetWithCount) -> core::cmp::Ordering {
    b.count
        .total_cmp(&a.count)
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| a.items.cmp(&b.items))
}

/// The rounding allowed between two decayed counts that should be equal.
const COUNT_ULPS: i64 = 256;

/// Whether two counts are equal up to rounding.
fn same_count(a: f64, b: f64) -> bool {
    float_cmp::approx_eq!(f64, a, b, epsilon = 0.0, ulps = COUNT_ULPS)
}

/// Rank itemsets and drop any itemset that is a subset of a kept itemset
/// with the same count, so only the largest of near-identical explanations
/// remains.
///
/// Counts within rounding of the first count of a group join that group.
#[must_use]
pub(crate) fn rank_and_collapse(mut itemsets: Vec<ItemsetWithCount>) -> Vec<ItemsetWithCount> {
    itemsets.sort_by(rank_order);

    let mut kept = Vec::with_capacity(itemsets.len());
    let mut group: Vec<ItemsetWithCount> = Vec::new();
    for itemset in itemsets {
        if group.first().is_some_and(|g| !same_count(g.count, itemset.count)) {
            collapse_group(&mut group, &mut kept);
        }
        group.push(itemset);
    }
    collapse_group(&mut group, &mut kept);
    kept
}

/// Move one equal-count group into `kept`, largest first, skipping any
/// itemset that is a subset of one already kept from the group.
fn collapse_group(group: &mut Vec<ItemsetWithCount>, kept: &mut Vec<ItemsetWithCount>) {
    group.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.items.cmp(&b.items)));
    let start = kept.len();
    for itemset in group.drain(..) {
        if !kept[start..].iter().any(|k| itemset.is_subset_of(k)) {
            kept.push(itemset);
        }
    }
}

/// Sort ratio-tagged itemsets in rank order and decode them into results.
pub(crate) fn into_results<D: AttributeDecoder + ?Sized>(
    mut emerging: Vec<(ItemsetWithCount, f64)>,
    outlier_total: f64,
    decoder: &D,
) -> Vec<ItemsetResult> {
    emerging.sort_by(|(a, _), (b, _)| rank_order(a, b));
    emerging
        .iter()
        .map(|(itemset, ratio)| ItemsetResult::new(itemset, outlier_total, *ratio, decoder))
        .collect()
}
