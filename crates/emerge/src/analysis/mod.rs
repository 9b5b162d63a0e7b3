//! End-to-end analyses: load records, flag outliers, explain them.

mod batch;
mod config;
mod streaming;
mod worker;

use serde::{Deserialize, Serialize};

pub use batch::BatchAnalyzer;
pub use config::{AnalysisConfig, StreamingConfig, Threshold};
pub use streaming::StreamingAnalyzer;
pub use worker::run_with_timeout;

use crate::{itemset::ItemsetResult, MetricRecord, Result};

/// Supplies the records for one batch analysis.
pub trait RecordSource {
    /// Load every record of the batch.
    ///
    /// # Errors
    ///
    /// * `Source` if the records could not be loaded.
    fn load(&mut self) -> Result<Vec<MetricRecord>>;
}

impl RecordSource for Vec<MetricRecord> {
    fn load(&mut self) -> Result<Vec<MetricRecord>> {
        Ok(self.clone())
    }
}

/// The outcome of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The number of records flagged as outliers.
    pub outlier_count: usize,
    /// The number of records not flagged.
    pub inlier_count: usize,
    /// Time spent loading records.
    pub load_time_ms: u128,
    /// Time spent training the detector and classifying records.
    pub classify_time_ms: u128,
    /// Time spent mining explanations.
    pub summarize_time_ms: u128,
    /// The explanations, best first.
    pub itemsets: Vec<ItemsetResult>,
}

impl AnalysisResult {
    /// A result with every record counted as an inlier and nothing to explain.
    #[must_use]
    pub const fn no_signal(num_records: usize, load_time_ms: u128, classify_time_ms: u128) -> Self {
        Self {
            outlier_count: 0,
            inlier_count: num_records,
            load_time_ms,
            classify_time_ms,
            summarize_time_ms: 0,
            itemsets: Vec::new(),
        }
    }
}
