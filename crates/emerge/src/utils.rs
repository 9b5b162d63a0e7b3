//! Utility functions for the crate.

use core::cmp::Ordering;

/// Calculate the mean and variance of the given values.
///
/// Calculates the mean and population variance using a single pass algorithm.
///
/// # Arguments:
///
/// * `values` - The values to calculate the mean and variance of.
///
/// # Returns:
///
/// A tuple containing the mean and variance of the given values, or `None`
/// if `values` is empty.
#[must_use]
pub fn mean_variance(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let (sum, sum_squares) = values
        .iter()
        .fold((0.0, 0.0), |(sum, sum_squares), &x| (sum + x, x.mul_add(x, sum_squares)));

    let mean = sum / n;
    // Rounding can push the variance of constant data slightly below zero.
    let variance = mean.mul_add(-mean, sum_squares / n).max(0.0);

    Some((mean, variance))
}

/// Find the median of the given values.
///
/// If the number of elements is even, the median is the mean of the two
/// middle elements. NAN values are ordered with `f64::total_cmp`.
///
/// This will return `None` if the given slice is empty.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut values = values.to_vec();
    let even = values.len() % 2 == 0;
    let mid = values.len() / 2;
    let (lower, &mut upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);

    if even {
        // The lower middle is the largest value left of `mid`.
        let lower_mid = lower.iter().copied().max_by(f64::total_cmp)?;
        Some((lower_mid + upper) / 2.0)
    } else {
        Some(upper)
    }
}

/// Order scored items by descending score, with NAN sorted last.
pub fn descending<T>(items: &mut [T], score: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| match (score(a), score(b)) {
        (x, y) if x.is_nan() && y.is_nan() => Ordering::Equal,
        (x, _) if x.is_nan() => Ordering::Greater,
        (_, y) if y.is_nan() => Ordering::Less,
        (x, y) => y.total_cmp(&x),
    });
}
