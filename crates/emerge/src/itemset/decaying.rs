//! Emerging itemsets over a stream, with exponentially decaying counts.

use std::collections::HashMap;

use super::{frequency_ratio, into_results, rank_and_collapse, ItemsetResult, StreamingFpGrowth};
use crate::{
    count::{ApproximateCount, Counter, CounterKind},
    AttributeDecoder, AttributeId, MetricRecord,
};

/// A streaming session that explains outliers as they arrive.
///
/// Records are fed one at a time with [`mark_outlier`](Self::mark_outlier)
/// and [`mark_inlier`](Self::mark_inlier). At every period boundary the
/// caller invokes [`mark_period`](Self::mark_period), which ages all counts by
/// `1 - decay_rate` and refreshes the set of interesting attributes that the
/// pattern trees track.
///
/// The session is not internally synchronized. Concurrent writers must
/// serialize their calls.
#[derive(Debug, Clone)]
pub struct DecayingEmergingItemsets {
    /// The fraction of outlier weight an itemset must cover.
    min_support: f64,
    /// The minimum outlier-to-inlier frequency ratio.
    min_ratio: f64,
    /// The fraction of weight forgotten at each period.
    decay_rate: f64,
    /// How outlier attributes are counted.
    outlier_kind: CounterKind,
    /// How inlier attributes are counted.
    inlier_kind: CounterKind,
    /// Per-attribute outlier counts.
    outlier_counts: Counter,
    /// Per-attribute inlier counts.
    inlier_counts: Counter,
    /// Outlier transactions, for mining.
    outlier_patterns: StreamingFpGrowth,
    /// Inlier transactions, for verifying combinations.
    inlier_patterns: StreamingFpGrowth,
    /// The attributes passing both thresholds at the last refresh, with their outlier counts.
    interesting: HashMap<AttributeId, f64>,
}

impl DecayingEmergingItemsets {
    /// Start an empty session.
    ///
    /// # Arguments
    ///
    /// * `min_support`: the fraction of outlier weight, in `[0, 1]`, an itemset must cover.
    /// * `min_ratio`: the minimum outlier-to-inlier frequency ratio.
    /// * `decay_rate`: the fraction of weight forgotten at each period, in `[0, 1)`.
    /// * `outlier_kind`: the counter for outlier attributes.
    /// * `inlier_kind`: the counter for inlier attributes.
    #[must_use]
    pub fn new(
        min_support: f64,
        min_ratio: f64,
        decay_rate: f64,
        outlier_kind: CounterKind,
        inlier_kind: CounterKind,
    ) -> Self {
        Self {
            min_support,
            min_ratio,
            decay_rate,
            outlier_kind,
            inlier_kind,
            outlier_counts: outlier_kind.build(),
            inlier_counts: inlier_kind.build(),
            outlier_patterns: StreamingFpGrowth::new(min_support),
            inlier_patterns: StreamingFpGrowth::new(0.0),
            interesting: HashMap::new(),
        }
    }

    /// Record an outlier.
    pub fn mark_outlier(&mut self, record: &MetricRecord) {
        self.outlier_counts.observe(record.attributes());
        self.outlier_patterns.insert_transaction(record.attributes());
    }

    /// Record an inlier.
    pub fn mark_inlier(&mut self, record: &MetricRecord) {
        self.inlier_counts.observe(record.attributes());
        self.inlier_patterns.insert_transaction(record.attributes());
    }

    /// Close a period: decay every count and refresh the interesting attributes.
    pub fn mark_period(&mut self) {
        let factor = 1.0 - self.decay_rate;
        self.outlier_counts.multiply_all_counts(factor);
        self.inlier_counts.multiply_all_counts(factor);
        self.update_models(self.decay_rate);
    }

    /// Refresh the interesting attributes and rebuild the pattern trees
    /// without decaying anything.
    pub fn update_models_no_decay(&mut self) {
        self.update_models(0.0);
    }

    /// Recompute the interesting attributes from the counters, then decay
    /// the pattern trees by `decay_rate` and restrict them to those attributes.
    ///
    /// The counters must already be decayed, so the totals are scaled to match.
    fn update_models(&mut self, decay_rate: f64) {
        let factor = 1.0 - decay_rate;
        let outlier_total = self.outlier_count() * factor;
        let inlier_total = self.inlier_count() * factor;
        let min_count = self.min_support * outlier_total;

        self.interesting = self
            .outlier_counts
            .counts()
            .into_iter()
            .filter(|&(item, count)| {
                count >= min_count
                    && frequency_ratio(count, outlier_total, self.inlier_counts.count(item), inlier_total)
                        >= self.min_ratio
            })
            .collect();
        ftlog::debug!("Found {} interesting attributes", self.interesting.len());

        self.outlier_patterns
            .decay_and_reset_frequent_items(&self.interesting, decay_rate);
        self.inlier_patterns
            .decay_and_reset_frequent_items(&self.interesting, decay_rate);
    }

    /// The interesting attributes as of the last refresh, with their outlier counts.
    #[must_use]
    pub const fn interesting_items(&self) -> &HashMap<AttributeId, f64> {
        &self.interesting
    }

    /// The decayed number of outliers seen.
    #[must_use]
    pub const fn outlier_count(&self) -> f64 {
        self.outlier_patterns.total_weight()
    }

    /// The decayed number of inliers seen.
    #[must_use]
    pub const fn inlier_count(&self) -> f64 {
        self.inlier_patterns.total_weight()
    }

    /// The per-attribute outlier counter.
    #[must_use]
    pub const fn outlier_counts(&self) -> &Counter {
        &self.outlier_counts
    }

    /// The per-attribute inlier counter.
    #[must_use]
    pub const fn inlier_counts(&self) -> &Counter {
        &self.inlier_counts
    }

    /// The current emerging itemsets, ranked as in the batch miner.
    pub fn itemsets<D: AttributeDecoder + ?Sized>(&self, decoder: &D) -> Vec<ItemsetResult> {
        let outlier_total = self.outlier_count();
        let inlier_total = self.inlier_count();
        if outlier_total <= 0.0 {
            return Vec::new();
        }

        let ranked = rank_and_collapse(self.outlier_patterns.itemsets());
        let (singles, multis): (Vec<_>, Vec<_>) = ranked.into_iter().partition(|i| i.len() == 1);

        let mut emerging = singles
            .into_iter()
            .filter_map(|i| {
                let item = i.items()[0];
                let ratio = frequency_ratio(
                    self.outlier_counts.count(item),
                    outlier_total,
                    self.inlier_counts.count(item),
                    inlier_total,
                );
                (ratio >= self.min_ratio).then_some((i, ratio))
            })
            .collect::<Vec<_>>();

        let inlier_matches = self.inlier_patterns.counts_of(&multis);
        assert_eq!(
            inlier_matches.len(),
            multis.len(),
            "every candidate itemset must get an inlier count"
        );
        emerging.extend(multis.into_iter().zip(&inlier_matches).filter_map(|(o, i)| {
            let ratio = frequency_ratio(o.count(), outlier_total, i.count(), inlier_total);
            (ratio >= self.min_ratio).then_some((o, ratio))
        }));

        into_results(emerging, outlier_total, decoder)
    }

    /// Forget all counts, patterns and interesting attributes.
    pub fn reset(&mut self) {
        *self = Self::new(
            self.min_support,
            self.min_ratio,
            self.decay_rate,
            self.outlier_kind,
            self.inlier_kind,
        );
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use test_case::test_case;

    use super::DecayingEmergingItemsets;
    use crate::{
        count::{ApproximateCount, CounterKind},
        AttributeEncoder, MetricRecord,
    };

    fn record(attributes: &[u32]) -> MetricRecord {
        MetricRecord::new(vec![0.0], attributes.to_vec())
    }

    fn session(decay_rate: f64, kind: CounterKind) -> DecayingEmergingItemsets {
        let mut s = DecayingEmergingItemsets::new(0.2, 3.0, decay_rate, kind, kind);
        for _ in 0..10 {
            s.mark_outlier(&record(&[1, 2]));
        }
        for _ in 0..10 {
            s.mark_outlier(&record(&[3]));
        }
        for _ in 0..100 {
            s.mark_inlier(&record(&[3, 4]));
        }
        s.mark_inlier(&record(&[1]));
        s
    }

    #[test_case(CounterKind::Exact ; "exact")]
    #[test_case(CounterKind::Thresholded { floor: 0.01 } ; "thresholded")]
    #[test_case(CounterKind::SpaceSaving { capacity: 16 } ; "space saving")]
    fn zero_decay_only_refreshes(kind: CounterKind) {
        let mut s = session(0.0, kind);
        let outliers = s.outlier_counts().counts();
        let inliers = s.inlier_counts().counts();

        s.mark_period();

        assert_eq!(s.outlier_counts().counts(), outliers);
        assert_eq!(s.inlier_counts().counts(), inliers);
        assert!(approx_eq!(f64, s.outlier_count(), 20.0));
        assert!(approx_eq!(f64, s.inlier_count(), 101.0));

        let mut interesting = s.interesting_items().keys().copied().collect::<Vec<_>>();
        interesting.sort_unstable();
        assert_eq!(interesting, vec![1, 2]);
    }

    #[test]
    fn itemsets_after_a_period() {
        let mut s = session(0.0, CounterKind::Exact);
        s.mark_period();

        let results = s.itemsets(&AttributeEncoder::default());
        let attributes = results.iter().map(|r| r.attributes().to_vec()).collect::<Vec<_>>();
        // {1} and {2} share the pair's count and collapse into it.
        assert_eq!(attributes, vec![vec![1, 2]]);

        let top = &results[0];
        assert!(approx_eq!(f64, top.count, 10.0));
        assert!(approx_eq!(f64, top.support, 0.5));
        assert!(top.ratio.is_infinite());
    }

    #[test]
    fn decay_ages_counts_and_totals() {
        let mut s = session(0.5, CounterKind::Exact);
        s.mark_period();
        assert!(approx_eq!(f64, s.outlier_counts().count(1), 5.0));
        assert!(approx_eq!(f64, s.outlier_count(), 10.0));
        assert!(approx_eq!(f64, s.inlier_count(), 50.5));

        let results = s.itemsets(&AttributeEncoder::default());
        assert!(approx_eq!(f64, results[0].count, 5.0));
        assert!(approx_eq!(f64, results[0].support, 0.5));
    }

    #[test]
    fn new_evidence_after_a_period() {
        let mut s = session(0.0, CounterKind::Exact);
        s.mark_period();
        // 5 is not interesting yet, so the trees ignore it until the next refresh.
        for _ in 0..30 {
            s.mark_outlier(&record(&[5]));
        }
        assert!(s.itemsets(&AttributeEncoder::default()).iter().all(|r| r.attributes() != [5]));

        s.update_models_no_decay();
        for _ in 0..30 {
            s.mark_outlier(&record(&[5]));
        }
        let results = s.itemsets(&AttributeEncoder::default());
        assert_eq!(results[0].attributes(), &[5]);
        assert!(approx_eq!(f64, results[0].count, 30.0));
    }

    #[test]
    fn reset_clears_the_session() {
        let mut s = session(0.1, CounterKind::Exact);
        s.mark_period();
        s.reset();
        assert!(approx_eq!(f64, s.outlier_count(), 0.0));
        assert!(s.interesting_items().is_empty());
        assert!(s.itemsets(&AttributeEncoder::default()).is_empty());
    }
}
