//! Continuous analysis of a stream of records.

use super::{AnalysisConfig, Threshold};
use crate::{
    itemset::{DecayingEmergingItemsets, ItemsetResult},
    outlier::{Detector, OutlierDetector},
    utils::descending,
    AttributeDecoder, MetricRecord, Result,
};

/// Flags and explains outliers as records arrive.
///
/// The first `warmup` records are buffered and used to fit the detector and
/// fix a score cut-off. From then on every record is scored, marked as an
/// outlier or an inlier in a [`DecayingEmergingItemsets`] session, and every
/// `period_length` records the session is aged.
#[derive(Debug, Clone)]
pub struct StreamingAnalyzer {
    /// The validated settings.
    config: AnalysisConfig,
    /// The fitted detector and its cut-off, once warmed up.
    detector: Option<(Detector, f64)>,
    /// Records waiting for the detector to be fitted.
    warmup: Vec<MetricRecord>,
    /// The explanation session.
    session: DecayingEmergingItemsets,
    /// Records seen in the current period.
    in_period: usize,
    /// Records flagged so far.
    num_outliers: usize,
    /// Records not flagged so far.
    num_inliers: usize,
}

impl StreamingAnalyzer {
    /// Create an analyzer.
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` if `config` does not validate.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let streaming = &config.streaming;
        let session = DecayingEmergingItemsets::new(
            config.min_support,
            config.min_ratio,
            streaming.decay_rate,
            streaming.outlier_summary,
            streaming.inlier_summary,
        );
        Ok(Self {
            config,
            detector: None,
            warmup: Vec::with_capacity(streaming.warmup),
            session,
            in_period: 0,
            num_outliers: 0,
            num_inliers: 0,
        })
    }

    /// Feed one record.
    ///
    /// # Errors
    ///
    /// * `DimensionMismatch` if the record does not fit the detector.
    /// * Non-recoverable errors from fitting the detector.
    pub fn consume(&mut self, record: MetricRecord) -> Result<()> {
        if self.detector.is_some() {
            return self.observe(&record);
        }

        self.warmup.push(record);
        if self.warmup.len() >= self.config.streaming.warmup {
            self.fit()?;
        }
        Ok(())
    }

    /// Feed several records in order.
    ///
    /// # Errors
    ///
    /// See [`StreamingAnalyzer::consume`].
    pub fn consume_all<I: IntoIterator<Item = MetricRecord>>(&mut self, records: I) -> Result<()> {
        records.into_iter().try_for_each(|r| self.consume(r))
    }

    /// Fit the detector on the buffered records, then replay them.
    ///
    /// If the model is degenerate the buffered records are counted as
    /// inliers and the next warmup window is tried instead.
    fn fit(&mut self) -> Result<()> {
        let warmup = core::mem::take(&mut self.warmup);
        let dimension = warmup.first().map_or(0, MetricRecord::dimension);
        let mut detector = Detector::from_kind(self.config.detector_for(dimension), dimension, self.config.seed);

        match detector.train(&warmup).and_then(|()| cutoff(&detector, &warmup, self.config.threshold)) {
            Ok(cutoff) => {
                ftlog::info!(
                    "Fitted {} on {} records with cut-off {cutoff}",
                    detector.name(),
                    warmup.len()
                );
                self.detector = Some((detector, cutoff));
                warmup.iter().try_for_each(|r| self.observe(r))
            }
            Err(e) if e.is_recoverable() => {
                ftlog::warn!("No signal in {} warmup records: {e}", warmup.len());
                for record in &warmup {
                    self.session.mark_inlier(record);
                    self.num_inliers += 1;
                    self.tick();
                }
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Score one record and mark it in the session.
    fn observe(&mut self, record: &MetricRecord) -> Result<()> {
        let Some((detector, cutoff)) = &self.detector else {
            return Ok(());
        };
        if detector.score(record)? > *cutoff {
            self.session.mark_outlier(record);
            self.num_outliers += 1;
        } else {
            self.session.mark_inlier(record);
            self.num_inliers += 1;
        }
        self.tick();
        Ok(())
    }

    /// Count one record towards the period, closing it when full.
    fn tick(&mut self) {
        self.in_period += 1;
        if self.in_period >= self.config.streaming.period_length {
            ftlog::debug!(
                "Closing a period: {} outliers and {} inliers so far",
                self.num_outliers,
                self.num_inliers
            );
            self.session.mark_period();
            self.in_period = 0;
        }
    }

    /// The current explanations.
    pub fn itemsets<D: AttributeDecoder + ?Sized>(&self, decoder: &D) -> Vec<ItemsetResult> {
        self.session.itemsets(decoder)
    }

    /// Whether the detector has been fitted.
    #[must_use]
    pub const fn is_warm(&self) -> bool {
        self.detector.is_some()
    }

    /// The score above which records are flagged, once warmed up.
    #[must_use]
    pub fn cutoff(&self) -> Option<f64> {
        self.detector.as_ref().map(|&(_, c)| c)
    }

    /// The number of records flagged so far.
    #[must_use]
    pub const fn outlier_count(&self) -> usize {
        self.num_outliers
    }

    /// The number of records not flagged so far.
    #[must_use]
    pub const fn inlier_count(&self) -> usize {
        self.num_inliers
    }

    /// The explanation session.
    #[must_use]
    pub const fn session(&self) -> &DecayingEmergingItemsets {
        &self.session
    }

    /// Forget the detector, the buffered records and the session.
    pub fn reset(&mut self) {
        self.detector = None;
        self.warmup.clear();
        self.session.reset();
        self.in_period = 0;
        self.num_outliers = 0;
        self.num_inliers = 0;
    }
}

/// The score above which records are flagged.
///
/// For a percentile this is the largest score among the lowest
/// `floor(n * percentile)` warmup scores, matching the batch split.
fn cutoff(detector: &Detector, warmup: &[MetricRecord], threshold: Threshold) -> Result<f64> {
    match threshold {
        Threshold::ZScore(z) => detector.zscore_equivalent(z),
        Threshold::Percentile(p) => {
            let mut scores = warmup.iter().map(|r| detector.score(r)).collect::<Result<Vec<_>>>()?;
            descending(&mut scores, |&s| s);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
            let num_inliers = ((scores.len() as f64) * p).floor() as usize;
            let num_outliers = scores.len() - num_inliers.min(scores.len());
            Ok(scores.get(num_outliers).copied().unwrap_or(f64::NEG_INFINITY))
        }
    }
}
