//! Classification always splits the input into disjoint, exhaustive parts.

use emerge::{
    outlier::{BatchResult, Detector, OutlierDetector},
    MetricRecord,
};
use test_case::test_case;

mod common;

fn check_partition(batch: &BatchResult, n: usize) {
    assert_eq!(batch.num_inliers() + batch.num_outliers(), n);

    let mut ids = batch
        .inliers()
        .iter()
        .chain(batch.outliers())
        .flat_map(|s| s.record.attributes().to_vec())
        .collect::<Vec<_>>();
    ids.sort_unstable();
    let expected = (0..u32::try_from(n).unwrap()).collect::<Vec<_>>();
    assert_eq!(ids, expected);

    for part in [batch.inliers(), batch.outliers()] {
        assert!(part.windows(2).all(|w| w[0].score >= w[1].score));
    }
    if let (Some(lowest_outlier), Some(highest_inlier)) = (batch.outliers().last(), batch.inliers().first()) {
        assert!(lowest_outlier.score >= highest_inlier.score);
    }
}

fn detectors(data: &[MetricRecord], dim: usize) -> Vec<Detector> {
    let mut detectors = if dim == 1 {
        vec![Detector::zscore(), Detector::mad()]
    } else {
        vec![Detector::min_cov_det(dim, Some(42))]
    };
    for d in &mut detectors {
        d.train(data).unwrap();
    }
    detectors
}

#[test_case(1, 0.0 ; "line at zero")]
#[test_case(1, 0.5 ; "line at half")]
#[test_case(1, 0.99 ; "line at 99th")]
#[test_case(1, 1.0 ; "line at one")]
#[test_case(3, 0.25 ; "gaussian at quarter")]
#[test_case(3, 0.95 ; "gaussian at 95th")]
fn by_percentile(dim: usize, percentile: f64) {
    let data = common::indexed_gaussian(400, dim, 7);
    for detector in detectors(&data, dim) {
        let batch = detector.classify_by_percentile(data.clone(), percentile).unwrap();
        check_partition(&batch, data.len());

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let expected_inliers = (data.len() as f64 * percentile).floor() as usize;
        assert_eq!(batch.num_inliers(), expected_inliers, "{}", detector.name());
    }
}

#[test_case(1, 1.0 ; "line at one")]
#[test_case(1, 3.0 ; "line at three")]
#[test_case(3, 2.0 ; "gaussian at two")]
fn by_zscore(dim: usize, zscore: f64) {
    let data = common::indexed_gaussian(400, dim, 11);
    for detector in detectors(&data, dim) {
        let threshold = detector.zscore_equivalent(zscore).unwrap();
        let batch = detector.classify_by_zscore_equivalent(data.clone(), zscore).unwrap();
        check_partition(&batch, data.len());

        assert!(batch.outliers().iter().all(|s| s.score > threshold));
        assert!(batch.inliers().iter().all(|s| s.score <= threshold));
    }
}

#[test]
fn ties_are_split_consistently() {
    let data = common::indexed_line(&[1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 50.0, 50.0]);
    let mut detector = Detector::mad();
    detector.train(&data).unwrap();

    let batch = detector.classify_by_percentile(data.clone(), 0.8).unwrap();
    check_partition(&batch, data.len());
    assert_eq!(batch.num_outliers(), 2);
    assert!(batch.outliers().iter().all(|s| s.record.metrics() == [50.0]));
}
