//! Univariate z-score detector.

use super::{univariate, OutlierDetector};
use crate::{utils::mean_variance, Error, MetricRecord, Result};

/// Scores a single metric by its distance from the mean in standard deviations.
#[derive(Debug, Clone, Default)]
pub struct ZScore {
    /// The mean and standard deviation of the training sample.
    model: Option<(f64, f64)>,
}

impl ZScore {
    /// The mean of the training sample, if trained.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        self.model.map(|(mean, _)| mean)
    }

    /// The standard deviation of the training sample, if trained.
    #[must_use]
    pub fn std_dev(&self) -> Option<f64> {
        self.model.map(|(_, std_dev)| std_dev)
    }
}

impl OutlierDetector for ZScore {
    fn name(&self) -> &'static str {
        "zscore"
    }

    fn train(&mut self, sample: &[MetricRecord]) -> Result<()> {
        self.model = None;

        let values = sample.iter().map(univariate).collect::<Result<Vec<_>>>()?;
        let (mean, variance) =
            mean_variance(&values).ok_or_else(|| Error::DegenerateModel("empty training sample".to_string()))?;
        let std_dev = variance.sqrt();

        ftlog::debug!("mean is {mean} std is {std_dev}");
        if std_dev == 0.0 || !std_dev.is_finite() {
            return Err(Error::DegenerateModel(format!(
                "standard deviation is {std_dev}"
            )));
        }

        self.model = Some((mean, std_dev));
        Ok(())
    }

    fn score(&self, record: &MetricRecord) -> Result<f64> {
        let (mean, std_dev) = self.model.ok_or(Error::NotTrained)?;
        Ok((univariate(record)? - mean).abs() / std_dev)
    }

    fn zscore_equivalent(&self, zscore: f64) -> Result<f64> {
        Ok(zscore)
    }
}
