//! Dense linear algebra for the covariance models.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::{Error, Result};

/// Pivots smaller than this in absolute value mark a matrix as singular.
const SINGULARITY_THRESHOLD: f64 = 1e-11;

/// Compute the mean and the sample covariance (denominator `m - 1`) of the
/// rows of `data` selected by `indices`.
///
/// With a single row the covariance is all zeros.
#[must_use]
pub fn mean_and_covariance(data: ArrayView2<f64>, indices: &[usize]) -> (Array1<f64>, Array2<f64>) {
    let subset = data.select(Axis(0), indices);
    let m = subset.nrows();
    let p = subset.ncols();

    let mean = subset.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(p));
    if m < 2 {
        return (mean, Array2::zeros((p, p)));
    }

    let centered = &subset - &mean;
    #[allow(clippy::cast_precision_loss)]
    let covariance = centered.t().dot(&centered) / (m - 1) as f64;
    (mean, covariance)
}

/// The Mahalanobis distance of `x` from `mean` given the inverse covariance.
///
/// `sqrt((x - mean)^T · inverse · (x - mean))`, clamped at zero against rounding.
#[must_use]
pub fn mahalanobis(mean: ArrayView1<f64>, inverse: ArrayView2<f64>, x: ArrayView1<f64>) -> f64 {
    let diff = &x - &mean;
    diff.dot(&inverse.dot(&diff)).max(0.0).sqrt()
}

/// An LU decomposition with partial pivoting, `P·A = L·U`.
///
/// `L` has an implicit unit diagonal and shares storage with `U`.
#[derive(Debug, Clone)]
pub struct Lu {
    /// The packed `L` and `U` factors.
    lu: Array2<f64>,
    /// Row `i` of `P·A` is row `pivots[i]` of `A`.
    pivots: Vec<usize>,
    /// Whether an even number of row swaps was made.
    even: bool,
    /// Whether a pivot fell below the singularity threshold.
    singular: bool,
}

impl Lu {
    /// Factor a square matrix.
    ///
    /// # Errors
    ///
    /// * `DimensionMismatch` if the matrix is not square.
    pub fn factor(matrix: ArrayView2<f64>) -> Result<Self> {
        let n = matrix.nrows();
        if matrix.ncols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: matrix.ncols(),
            });
        }

        let mut lu = matrix.to_owned();
        let mut pivots = (0..n).collect::<Vec<_>>();
        let mut even = true;

        for k in 0..n {
            let (p, max) = (k..n)
                .map(|i| (i, lu[[i, k]].abs()))
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .unwrap_or((k, 0.0));

            if max < SINGULARITY_THRESHOLD || !max.is_finite() {
                return Ok(Self {
                    lu,
                    pivots,
                    even,
                    singular: true,
                });
            }

            if p != k {
                for j in 0..n {
                    lu.swap([p, j], [k, j]);
                }
                pivots.swap(p, k);
                even = !even;
            }

            let pivot = lu[[k, k]];
            for i in (k + 1)..n {
                let factor = lu[[i, k]] / pivot;
                lu[[i, k]] = factor;
                for j in (k + 1)..n {
                    lu[[i, j]] -= factor * lu[[k, j]];
                }
            }
        }

        Ok(Self {
            lu,
            pivots,
            even,
            singular: false,
        })
    }

    /// Whether the matrix is numerically singular.
    #[must_use]
    pub const fn is_singular(&self) -> bool {
        self.singular
    }

    /// The determinant of the factored matrix. Zero if it is singular.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        if self.singular {
            return 0.0;
        }
        let product = self.lu.diag().iter().product::<f64>();
        if self.even {
            product
        } else {
            -product
        }
    }

    /// The inverse of the factored matrix.
    ///
    /// # Errors
    ///
    /// * `NumericalInstability` if the matrix is singular.
    pub fn inverse(&self) -> Result<Array2<f64>> {
        if self.singular {
            return Err(Error::NumericalInstability("matrix is singular".to_string()));
        }

        let n = self.lu.nrows();
        let mut inverse = Array2::<f64>::zeros((n, n));
        let mut y = vec![0.0_f64; n];

        for c in 0..n {
            // Forward substitution with the unit lower factor on `P·e_c`.
            for i in 0..n {
                let b = if self.pivots[i] == c { 1.0 } else { 0.0 };
                y[i] = (0..i).fold(b, |acc, j| self.lu[[i, j]].mul_add(-y[j], acc));
            }
            // Back substitution with the upper factor.
            for i in (0..n).rev() {
                let sum = ((i + 1)..n).fold(y[i], |acc, j| self.lu[[i, j]].mul_add(-inverse[[j, c]], acc));
                inverse[[i, c]] = sum / self.lu[[i, i]];
            }
        }

        Ok(inverse)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};

    use super::*;

    #[test]
    fn determinant_and_inverse() {
        let m = arr2(&[[4.0, 7.0], [2.0, 6.0]]);
        let lu = Lu::factor(m.view()).unwrap();
        assert!(float_cmp::approx_eq!(f64, lu.determinant(), 10.0, epsilon = 1e-12));

        let inv = lu.inverse().unwrap();
        let expected = arr2(&[[0.6, -0.7], [-0.2, 0.4]]);
        for (a, b) in inv.iter().zip(expected.iter()) {
            assert!(float_cmp::approx_eq!(f64, *a, *b, epsilon = 1e-12), "{a} != {b}");
        }
    }

    #[test]
    fn pivoting_flips_sign() {
        let m = arr2(&[[0.0, 1.0], [1.0, 0.0]]);
        let lu = Lu::factor(m.view()).unwrap();
        assert!(float_cmp::approx_eq!(f64, lu.determinant(), -1.0, ulps = 2));
    }

    #[test]
    fn singular_matrix_fails_loudly() {
        let m = arr2(&[[1.0, 2.0], [2.0, 4.0]]);
        let lu = Lu::factor(m.view()).unwrap();
        assert!(lu.is_singular());
        assert_eq!(lu.determinant(), 0.0);
        assert!(matches!(lu.inverse(), Err(Error::NumericalInstability(_))));
    }

    #[test]
    fn covariance_of_subset() {
        let data = arr2(&[[1.0, 2.0], [3.0, 6.0], [100.0, 100.0], [5.0, 10.0]]);
        let (mean, cov) = mean_and_covariance(data.view(), &[0, 1, 3]);
        assert_eq!(mean, arr1(&[3.0, 6.0]));
        assert_eq!(cov, arr2(&[[4.0, 8.0], [8.0, 16.0]]));
    }

    #[test]
    fn mahalanobis_with_identity_is_euclidean() {
        let identity = Array2::<f64>::eye(2);
        let d = mahalanobis(arr1(&[0.0, 0.0]).view(), identity.view(), arr1(&[3.0, 4.0]).view());
        assert!(float_cmp::approx_eq!(f64, d, 5.0, ulps = 2));
    }
}
