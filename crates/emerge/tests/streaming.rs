//! Streaming analysis with decaying counts.

use emerge::{
    analysis::{AnalysisConfig, StreamingAnalyzer, StreamingConfig, Threshold},
    count::{ApproximateCount, CounterKind},
    itemset::DecayingEmergingItemsets,
    AttributeEncoder, MetricRecord,
};
use float_cmp::approx_eq;
use rand::prelude::*;
use symagen::contamination::Contaminated;
use test_case::test_case;

mod common;

/// 1900 inliers and 100 shifted outliers in random order. Attribute 7 is in
/// 90 of the outliers and 5 of the inliers.
fn shuffled(seed: u64) -> Vec<MetricRecord> {
    let mut data = Contaminated::gaussian(1900, 100, 1, 20.0, seed);
    let mut rng = StdRng::seed_from_u64(seed);
    data.background(100..110, 2, &mut rng);
    data.plant(7, 90, 5, &mut rng);

    let mut records = common::records(&data);
    records.shuffle(&mut rng);
    records
}

#[test_case(CounterKind::Exact ; "exact")]
#[test_case(CounterKind::Thresholded { floor: 0.01 } ; "thresholded")]
#[test_case(CounterKind::SpaceSaving { capacity: 64 } ; "space saving")]
fn planted_attribute_emerges(kind: CounterKind) {
    let config = AnalysisConfig {
        threshold: Threshold::ZScore(3.0),
        min_support: 0.1,
        min_ratio: 2.0,
        streaming: StreamingConfig {
            decay_rate: 0.01,
            period_length: 100,
            warmup: 200,
            inlier_summary: kind,
            outlier_summary: kind,
        },
        ..Default::default()
    };
    let mut analyzer = StreamingAnalyzer::new(config).unwrap();
    analyzer.consume_all(shuffled(42)).unwrap();

    assert_eq!(analyzer.outlier_count() + analyzer.inlier_count(), 2000);
    assert!(analyzer.outlier_count() >= 100);
    assert!(analyzer.outlier_count() <= 130);

    let results = analyzer.itemsets(&AttributeEncoder::default());
    assert_eq!(results[0].attributes(), &[7]);
    assert!(results[0].ratio > 2.0);
    assert!(results[0].support > 0.5);
}

#[test]
fn zero_decay_period_keeps_counts() {
    let mut session = DecayingEmergingItemsets::new(0.1, 2.0, 0.0, CounterKind::Exact, CounterKind::Exact);
    for (i, record) in shuffled(3).iter().enumerate() {
        if record.metrics()[0] > 10.0 {
            session.mark_outlier(record);
        } else {
            session.mark_inlier(record);
        }
        if i % 500 == 499 {
            let outliers = session.outlier_counts().counts();
            let inliers = session.inlier_counts().counts();
            let (outlier_total, inlier_total) = (session.outlier_count(), session.inlier_count());

            session.mark_period();

            assert_eq!(session.outlier_counts().counts(), outliers);
            assert_eq!(session.inlier_counts().counts(), inliers);
            assert!(approx_eq!(f64, session.outlier_count(), outlier_total));
            assert!(approx_eq!(f64, session.inlier_count(), inlier_total));
        }
    }
    assert!(session.interesting_items().contains_key(&7));
}

#[test]
fn decay_forgets_old_evidence() {
    let mut session = DecayingEmergingItemsets::new(0.1, 2.0, 0.5, CounterKind::Exact, CounterKind::Exact);
    let old = MetricRecord::new(vec![0.0], vec![1]);
    let new = MetricRecord::new(vec![0.0], vec![2]);
    let normal = MetricRecord::new(vec![0.0], vec![3]);

    for _ in 0..100 {
        session.mark_inlier(&normal);
    }
    for _ in 0..20 {
        session.mark_outlier(&old);
    }
    for _ in 0..5 {
        session.mark_period();
    }
    for _ in 0..20 {
        session.mark_outlier(&new);
    }
    session.mark_period();
    assert!(session.interesting_items().contains_key(&2));
    assert!(!session.interesting_items().contains_key(&1));

    // The trees only track 2 from the refresh onwards.
    for _ in 0..20 {
        session.mark_outlier(&new);
    }
    let results = session.itemsets(&AttributeEncoder::default());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].attributes(), &[2]);
    assert!(approx_eq!(f64, results[0].count, 20.0));
    assert!(results[0].ratio.is_infinite());
}
