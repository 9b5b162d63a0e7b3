//! Batch mining of emerging itemsets from classified records.

use std::collections::{HashMap, HashSet};

use super::{frequency_ratio, into_results, rank_and_collapse, FpGrowth, FpTree, ItemsetResult, ItemsetWithCount};
use crate::{
    count::{ApproximateCount, ExactCount},
    outlier::BatchResult,
    AttributeDecoder, AttributeId,
};

/// Finds the itemsets that are common among outliers and rare among inliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpGrowthEmerging {
    /// The fraction of outliers an itemset must cover.
    min_support: f64,
    /// The minimum outlier-to-inlier frequency ratio.
    min_ratio: f64,
}

impl FpGrowthEmerging {
    /// Create a miner.
    ///
    /// # Arguments
    ///
    /// * `min_support`: the fraction of outliers, in `[0, 1]`, an itemset must cover.
    /// * `min_ratio`: how many times more frequent among outliers than among
    ///   inliers an itemset must be.
    #[must_use]
    pub const fn new(min_support: f64, min_ratio: f64) -> Self {
        Self { min_support, min_ratio }
    }

    /// The minimum support.
    #[must_use]
    pub const fn min_support(&self) -> f64 {
        self.min_support
    }

    /// The minimum ratio.
    #[must_use]
    pub const fn min_ratio(&self) -> f64 {
        self.min_ratio
    }

    /// Mine the emerging itemsets of a classification.
    ///
    /// Single attributes are first filtered by support and by a ratio
    /// strictly above `min_ratio`. Outlier transactions restricted to the
    /// survivors are mined with FP-growth, and each multi-attribute itemset
    /// is then counted among the inliers and kept if its ratio is at least
    /// `min_ratio`.
    ///
    /// Results are sorted by descending count, then by descending size.
    pub fn mine<D: AttributeDecoder + ?Sized>(&self, batch: &BatchResult, decoder: &D) -> Vec<ItemsetResult> {
        #[allow(clippy::cast_precision_loss)]
        let outlier_total = batch.num_outliers() as f64;
        into_results(self.emerging(batch), outlier_total, decoder)
    }

    /// The emerging itemsets of a classification with their ratios, unsorted.
    pub(crate) fn emerging(&self, batch: &BatchResult) -> Vec<(ItemsetWithCount, f64)> {
        let outliers = batch.outliers();
        let inliers = batch.inliers();
        if outliers.is_empty() {
            ftlog::debug!("No outliers to explain");
            return Vec::new();
        }

        #[allow(clippy::cast_precision_loss)]
        let (outlier_total, inlier_total) = (outliers.len() as f64, inliers.len() as f64);
        let min_count = self.min_support * outlier_total;

        let outlier_counts = ExactCount::from_records(outliers.iter().map(|s| &s.record));
        let inlier_counts = ExactCount::from_records(inliers.iter().map(|s| &s.record));

        let supported = outlier_counts
            .counts()
            .into_iter()
            .filter(|&(item, count)| {
                count >= min_count
                    && frequency_ratio(count, outlier_total, inlier_counts.count(item), inlier_total) > self.min_ratio
            })
            .collect::<HashMap<_, _>>();

        let transactions = outliers
            .iter()
            .map(|s| {
                s.record
                    .attributes()
                    .iter()
                    .filter(|i| supported.contains_key(i))
                    .copied()
                    .collect::<Vec<_>>()
            })
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>();
        ftlog::debug!(
            "{} of {} outliers carry one of {} candidate attributes",
            transactions.len(),
            outliers.len(),
            supported.len()
        );

        let ranked = rank_and_collapse(FpGrowth::mine_with_counts(&transactions, &supported, min_count));
        let (singles, multis): (Vec<_>, Vec<_>) = ranked.into_iter().partition(|i| i.len() == 1);

        let mut emerging = singles
            .into_iter()
            .map(|i| {
                let ratio = frequency_ratio(i.count(), outlier_total, inlier_counts.count(i.items()[0]), inlier_total);
                (i, ratio)
            })
            .collect::<Vec<_>>();

        if !multis.is_empty() {
            let relevant = multis.iter().flat_map(|i| i.items().iter().copied()).collect::<HashSet<_>>();
            let inlier_tree = inlier_tree(batch, &inlier_counts, &relevant);
            emerging.extend(multis.into_iter().filter_map(|i| {
                let ratio = frequency_ratio(i.count(), outlier_total, inlier_tree.support_of(i.items()), inlier_total);
                (ratio >= self.min_ratio).then_some((i, ratio))
            }));
        }

        ftlog::debug!("Found {} emerging itemsets", emerging.len());
        emerging
    }
}

/// An FP-tree over the inliers, restricted to the `relevant` attributes.
fn inlier_tree(batch: &BatchResult, inlier_counts: &ExactCount, relevant: &HashSet<AttributeId>) -> FpTree {
    let counts = relevant
        .iter()
        .map(|&i| (i, inlier_counts.count(i)))
        .filter(|&(_, c)| c > 0.0)
        .collect::<HashMap<_, _>>();
    let mut tree = FpTree::from_counts(&counts, 0.0);
    for s in batch.inliers() {
        tree.insert(s.record.attributes(), 1.0);
    }
    tree
}
