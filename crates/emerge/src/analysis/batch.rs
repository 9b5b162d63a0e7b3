//! One-shot analysis of a batch of records.

use std::time::{Duration, Instant};

use super::{run_with_timeout, AnalysisConfig, AnalysisResult, RecordSource, Threshold};
use crate::{
    itemset::{into_results, FpGrowthEmerging},
    outlier::{BatchResult, Detector, OutlierDetector},
    AttributeDecoder, Error, MetricRecord, Result,
};

/// Loads a batch, flags its outliers and explains them.
#[derive(Debug, Clone)]
pub struct BatchAnalyzer {
    /// The validated settings.
    config: AnalysisConfig,
}

impl BatchAnalyzer {
    /// Create an analyzer.
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` if `config` does not validate.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The settings.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run one analysis.
    ///
    /// The detector is trained on the whole batch and then used to classify
    /// it. A degenerate or unstable model yields a "no signal" result with
    /// every record counted as an inlier. If mining overruns the configured
    /// budget, the result has no explanations.
    ///
    /// # Arguments
    ///
    /// * `source`: supplies the records.
    /// * `decoder`: labels attribute ids in the explanations.
    ///
    /// # Errors
    ///
    /// * Any error from `source`.
    /// * `DimensionMismatch` if the records disagree on their number of metrics.
    pub fn analyze<S, D>(&self, source: &mut S, decoder: &D) -> Result<AnalysisResult>
    where
        S: RecordSource + ?Sized,
        D: AttributeDecoder + ?Sized,
    {
        let start = Instant::now();
        let records = source.load()?;
        let load_time_ms = start.elapsed().as_millis();
        ftlog::debug!("Loaded {} records in {load_time_ms}ms", records.len());

        let num_records = records.len();
        if num_records == 0 {
            return Ok(AnalysisResult::no_signal(0, load_time_ms, 0));
        }

        let start = Instant::now();
        let batch = match self.classify(records) {
            Ok(batch) => batch,
            Err(e) if e.is_recoverable() => {
                ftlog::warn!("No signal in {num_records} records: {e}");
                return Ok(AnalysisResult::no_signal(
                    num_records,
                    load_time_ms,
                    start.elapsed().as_millis(),
                ));
            }
            Err(e) => return Err(e),
        };
        let classify_time_ms = start.elapsed().as_millis();
        ftlog::debug!(
            "Classified {} outliers and {} inliers in {classify_time_ms}ms",
            batch.num_outliers(),
            batch.num_inliers()
        );

        let outlier_count = batch.num_outliers();
        let inlier_count = batch.num_inliers();

        let start = Instant::now();
        let miner = FpGrowthEmerging::new(self.config.min_support, self.config.min_ratio);
        let budget = self.config.summarize_timeout_ms.map(Duration::from_millis);
        let emerging = match run_with_timeout("summarize", budget, move || miner.emerging(&batch)) {
            Ok(emerging) => emerging,
            Err(e @ (Error::Timeout { .. } | Error::Aborted(_))) => {
                ftlog::warn!("Reporting no explanations: {e}");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        #[allow(clippy::cast_precision_loss)]
        let itemsets = into_results(emerging, outlier_count as f64, decoder);
        let summarize_time_ms = start.elapsed().as_millis();
        ftlog::debug!("Found {} explanations in {summarize_time_ms}ms", itemsets.len());

        Ok(AnalysisResult {
            outlier_count,
            inlier_count,
            load_time_ms,
            classify_time_ms,
            summarize_time_ms,
            itemsets,
        })
    }

    /// Train the configured detector on `records` and split them.
    fn classify(&self, records: Vec<MetricRecord>) -> Result<BatchResult> {
        let dimension = records.first().map_or(0, MetricRecord::dimension);
        let mut detector = Detector::from_kind(self.config.detector_for(dimension), dimension, self.config.seed);
        detector.train(&records)?;
        ftlog::debug!("Trained {} on {} records", detector.name(), records.len());

        match self.config.threshold {
            Threshold::Percentile(p) => detector.classify_by_percentile(records, p),
            Threshold::ZScore(z) => detector.classify_by_zscore_equivalent(records, z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BatchAnalyzer;
    use crate::{
        analysis::{AnalysisConfig, RecordSource, Threshold},
        AttributeEncoder, Error, MetricRecord, Result,
    };

    /// A source that always fails.
    struct Broken;

    impl RecordSource for Broken {
        fn load(&mut self) -> Result<Vec<MetricRecord>> {
            Err(Error::Source("connection refused".to_string()))
        }
    }

    fn records(encoder: &mut AttributeEncoder) -> Vec<MetricRecord> {
        let normal = encoder.encode("device", "phone");
        let broken = encoder.encode("device", "toaster");
        let mut records = (0..95)
            .map(|i| MetricRecord::new(vec![f64::from(i % 7)], vec![normal]))
            .collect::<Vec<_>>();
        records.extend((0..5).map(|i| MetricRecord::new(vec![100.0 + f64::from(i)], vec![broken])));
        records
    }

    #[test]
    fn explains_the_outliers() {
        let mut encoder = AttributeEncoder::default();
        let mut source = records(&mut encoder);
        let config = AnalysisConfig {
            threshold: Threshold::Percentile(0.95),
            min_support: 0.5,
            ..Default::default()
        };

        let result = BatchAnalyzer::new(config).unwrap().analyze(&mut source, &encoder).unwrap();
        assert_eq!(result.outlier_count, 5);
        assert_eq!(result.inlier_count, 95);
        assert_eq!(result.itemsets.len(), 1);
        assert_eq!(result.itemsets[0].items[0].to_string(), "device=toaster");
        assert!(result.itemsets[0].ratio.is_infinite());
    }

    #[test]
    fn zscore_threshold() {
        let mut encoder = AttributeEncoder::default();
        let mut source = records(&mut encoder);
        let config = AnalysisConfig {
            threshold: Threshold::ZScore(3.0),
            ..Default::default()
        };

        let result = BatchAnalyzer::new(config).unwrap().analyze(&mut source, &encoder).unwrap();
        assert_eq!(result.outlier_count, 5);
        assert_eq!(result.itemsets[0].items[0].to_string(), "device=toaster");
    }

    #[test]
    fn constant_metrics_are_no_signal() {
        let mut source = vec![MetricRecord::new(vec![1.0], vec![1]); 20];
        let result = BatchAnalyzer::new(AnalysisConfig::default())
            .unwrap()
            .analyze(&mut source, &AttributeEncoder::default())
            .unwrap();
        assert_eq!(result.outlier_count, 0);
        assert_eq!(result.inlier_count, 20);
        assert!(result.itemsets.is_empty());
    }

    #[test]
    fn source_errors_propagate() {
        let analyzer = BatchAnalyzer::new(AnalysisConfig::default()).unwrap();
        let err = analyzer.analyze(&mut Broken, &AttributeEncoder::default()).unwrap_err();
        assert!(matches!(err, Error::Source(_)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = AnalysisConfig {
            min_support: 2.0,
            ..Default::default()
        };
        assert!(matches!(BatchAnalyzer::new(config), Err(Error::InvalidConfig(_))));
    }
}
