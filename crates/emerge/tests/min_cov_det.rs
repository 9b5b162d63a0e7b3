//! MinCovDet on contaminated multivariate normal data.

use emerge::{
    outlier::{MinCovDet, OutlierDetector},
    Error, MetricRecord, ScoredRecord,
};
use symagen::contamination::Contaminated;
use test_case::test_case;

mod common;

#[test_case(2, 42 ; "2d")]
#[test_case(3, 7 ; "3d")]
#[test_case(5, 1 ; "5d")]
fn determinants_never_increase(dim: usize, seed: u64) {
    let data = Contaminated::gaussian(450, 50, dim, 10.0, seed);
    let mut detector = MinCovDet::new(dim, Some(seed));
    detector.train(&common::records(&data)).unwrap();

    let determinants = detector.determinants();
    assert!(!determinants.is_empty());
    assert!(determinants.windows(2).all(|w| w[1] <= w[0]), "{determinants:?}");
    assert!(determinants.iter().all(|&d| d > 0.0));
}

#[test_case(2, 42 ; "2d")]
#[test_case(3, 7 ; "3d")]
#[test_case(5, 1 ; "5d")]
fn recovers_the_contamination(dim: usize, seed: u64) {
    let data = Contaminated::gaussian(450, 50, dim, 10.0, seed);
    let mut detector = MinCovDet::new(dim, Some(seed));
    let records = common::records(&data);
    detector.train(&records).unwrap();

    // The top 10% by distance are exactly the injected 10%.
    let batch = detector.classify_by_percentile(records, 0.9).unwrap();
    let flagged = batch
        .outliers()
        .iter()
        .filter(|s: &&ScoredRecord| s.record.metrics().iter().sum::<f64>() > 2.5 * dim as f64)
        .count();
    assert_eq!(batch.num_outliers(), 50);
    assert_eq!(flagged, 50);
}

#[test]
fn robust_mean_ignores_outliers() {
    let data = Contaminated::gaussian(400, 100, 2, 20.0, 5);
    let mut detector = MinCovDet::new(2, Some(5));
    detector.train(&common::records(&data)).unwrap();

    let model = detector.model().unwrap();
    assert!(model.mean().iter().all(|m| m.abs() < 0.5), "{}", model.mean());
}

#[test]
fn same_seed_same_model() {
    let data = Contaminated::gaussian(200, 20, 3, 8.0, 9);
    let records = common::records(&data);

    let mut a = MinCovDet::new(3, Some(11));
    let mut b = MinCovDet::new(3, Some(11));
    a.train(&records).unwrap();
    b.train(&records).unwrap();
    assert_eq!(a.determinants(), b.determinants());
}

#[test_case(2, 13 ; "2d")]
#[test_case(4, 17 ; "4d")]
fn sees_outliers_that_break_the_correlation(dim: usize, seed: u64) {
    let data = Contaminated::correlated(500, 20, dim, 0.9, seed);
    let records = common::records(&data);

    // No single axis singles out the planted rows.
    let widest_inlier = data
        .inlier_indices()
        .into_iter()
        .flat_map(|i| data.metrics[i][..2].to_vec())
        .fold(0.0, |acc: f64, v| acc.max(v.abs()));
    assert!(widest_inlier > 2.5, "{widest_inlier}");

    let mut detector = MinCovDet::new(dim, Some(seed));
    detector.train(&records).unwrap();

    let mut scores = records
        .iter()
        .map(|r| detector.score(r).unwrap())
        .enumerate()
        .collect::<Vec<_>>();
    scores.sort_by(|(_, a), (_, b)| b.total_cmp(a));
    assert!(scores[..20].iter().all(|&(i, _)| data.is_outlier[i]));
}

#[test]
fn mostly_collinear_data_keeps_a_valid_model() {
    let mut rows = (0..95).map(|i| vec![f64::from(i), f64::from(i)]).collect::<Vec<_>>();
    rows.extend([[10.0, 60.0], [30.0, -20.0], [50.0, 90.0], [70.0, 10.0], [90.0, 40.0]].map(|r| r.to_vec()));
    let records = rows
        .into_iter()
        .map(|m| MetricRecord::new(m, vec![]))
        .collect::<Vec<_>>();

    let mut trained = 0;
    for seed in 0..20 {
        let mut detector = MinCovDet::new(2, Some(seed));
        match detector.train(&records) {
            Ok(()) => {
                trained += 1;
                let model = detector.model().unwrap();
                assert!(model.determinant() > 0.0);
                assert!(!detector.determinants().is_empty());
                assert!(detector.score(&records[0]).unwrap().is_finite());
            }
            // Every seed subset drawn was collinear.
            Err(e) => {
                assert!(matches!(e, Error::NumericalInstability(_)), "{e}");
                assert!(detector.model().is_none());
            }
        }
    }
    assert!(trained > 0);
}
