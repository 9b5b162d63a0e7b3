//! Shared helpers for the integration tests.

#![allow(dead_code)]

use emerge::MetricRecord;
use symagen::contamination::Contaminated;

/// Wrap generated rows as records.
pub fn records(data: &Contaminated) -> Vec<MetricRecord> {
    data.metrics
        .iter()
        .zip(&data.attributes)
        .map(|(m, a)| MetricRecord::new(m.clone(), a.clone()))
        .collect()
}

/// Records along a line where the attribute of each record is its index.
pub fn indexed_line(values: &[f64]) -> Vec<MetricRecord> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| MetricRecord::new(vec![v], vec![u32::try_from(i).unwrap()]))
        .collect()
}

/// Records in `dim` dimensions where the attribute of each record is its index.
pub fn indexed_gaussian(cardinality: usize, dim: usize, seed: u64) -> Vec<MetricRecord> {
    let num_outliers = cardinality / 20;
    let data = Contaminated::gaussian(cardinality - num_outliers, num_outliers, dim, 6.0, seed);
    data.metrics
        .into_iter()
        .enumerate()
        .map(|(i, m)| MetricRecord::new(m, vec![u32::try_from(i).unwrap()]))
        .collect()
}
