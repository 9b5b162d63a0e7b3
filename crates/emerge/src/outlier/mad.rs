//! Univariate median absolute deviation detector.

use super::{univariate, OutlierDetector};
use crate::{utils::median, Error, MetricRecord, Result};

/// The ratio of the standard deviation to the MAD for normally distributed data.
pub const MAD_TO_ZSCORE_COEFFICIENT: f64 = 1.4826;

/// Scores a single metric by its distance from the median in units of the
/// median absolute deviation.
#[derive(Debug, Clone, Default)]
pub struct Mad {
    /// The median and MAD of the training sample.
    model: Option<(f64, f64)>,
}

impl Mad {
    /// The median of the training sample, if trained.
    #[must_use]
    pub fn median(&self) -> Option<f64> {
        self.model.map(|(median, _)| median)
    }

    /// The median absolute deviation of the training sample, if trained.
    #[must_use]
    pub fn mad(&self) -> Option<f64> {
        self.model.map(|(_, mad)| mad)
    }
}

impl OutlierDetector for Mad {
    fn name(&self) -> &'static str {
        "mad"
    }

    fn train(&mut self, sample: &[MetricRecord]) -> Result<()> {
        self.model = None;

        let values = sample.iter().map(univariate).collect::<Result<Vec<_>>>()?;
        let center = median(&values).ok_or_else(|| Error::DegenerateModel("empty training sample".to_string()))?;

        let residuals = values.iter().map(|&x| (x - center).abs()).collect::<Vec<_>>();
        let mad = median(&residuals).unwrap_or_default();

        ftlog::debug!("median is {center} mad is {mad}");
        if mad == 0.0 || !mad.is_finite() {
            return Err(Error::DegenerateModel(format!("median absolute deviation is {mad}")));
        }

        self.model = Some((center, mad));
        Ok(())
    }

    fn score(&self, record: &MetricRecord) -> Result<f64> {
        let (center, mad) = self.model.ok_or(Error::NotTrained)?;
        Ok((univariate(record)? - center).abs() / mad)
    }

    fn zscore_equivalent(&self, zscore: f64) -> Result<f64> {
        Ok(zscore * MAD_TO_ZSCORE_COEFFICIENT)
    }
}
