use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Pivots smaller than this (relative to the largest diagonal entry of the
/// normal matrix) mark a column as linearly dependent.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Ordinary least squares linear model, `y = X·β + b`.
///
/// # Solver
///
/// Normal equations `(AᵀA)θ = Aᵀy` with `A = [1 | X]`, solved in f64 by
/// Gauss-Jordan elimination with partial pivoting.
///
/// # Rank deficiency
///
/// A column whose pivot vanishes is a free variable and its coefficient is
/// fixed to 0. For an all-zero column, such as a zero-variance feature after
/// standardization, that is the least-norm solution. For general collinear
/// columns it is a basic least-squares solution: the fit is still optimal,
/// but the split of weight between the dependent columns is not the
/// minimum-norm one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    /// Build a model from known parameters.
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    pub fn fit(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<Self> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err(Error::EmptyDataset);
        }
        if y.len() != n_samples {
            return Err(Error::DimensionMismatch {
                expected: n_samples,
                got: y.len(),
            });
        }

        let mut design = Array2::<f64>::ones((n_samples, n_features + 1));
        design.slice_mut(s![.., 1..]).assign(&x);

        let xtx = design.t().dot(&design);
        let xty = design.t().dot(&y);
        let theta = solve_normal_equations(xtx, xty);

        Ok(Self {
            intercept: theta[0],
            coefficients: theta.slice(s![1..]).to_vec(),
        })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Raw prediction for one standardized row; callers clamp for display.
    pub fn predict(&self, x: &[f64]) -> Result<f64> {
        if x.len() != self.coefficients.len() {
            return Err(Error::DimensionMismatch {
                expected: self.coefficients.len(),
                got: x.len(),
            });
        }
        Ok(self
            .coefficients
            .iter()
            .zip(x)
            .map(|(c, v)| c * v)
            .sum::<f64>()
            + self.intercept)
    }

    pub fn predict_batch(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(Error::DimensionMismatch {
                expected: self.coefficients.len(),
                got: x.ncols(),
            });
        }
        let coefficients = ArrayView1::from(&self.coefficients[..]);
        Ok(x.dot(&coefficients) + self.intercept)
    }
}

/// Gauss-Jordan on the augmented system; free columns get 0.
fn solve_normal_equations(mut a: Array2<f64>, mut b: Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let scale = a
        .diag()
        .iter()
        .fold(1.0_f64, |m, v| m.max(v.abs()));
    let tolerance = PIVOT_TOLERANCE * scale;

    let mut pivot_row_of = vec![None; n];
    let mut next_row = 0;

    for col in 0..n {
        if next_row == n {
            break;
        }
        let (best, best_abs) = (next_row..n)
            .map(|r| (r, a[[r, col]].abs()))
            .fold((next_row, -1.0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
        if best_abs <= tolerance {
            continue;
        }

        if best != next_row {
            for c in 0..n {
                a.swap([best, c], [next_row, c]);
            }
            b.swap(best, next_row);
        }

        let pivot = a[[next_row, col]];
        a.row_mut(next_row).mapv_inplace(|v| v / pivot);
        b[next_row] /= pivot;

        let pivot_row = a.row(next_row).to_owned();
        let pivot_b = b[next_row];
        for r in 0..n {
            if r == next_row {
                continue;
            }
            let factor = a[[r, col]];
            if factor != 0.0 {
                a.row_mut(r).scaled_add(-factor, &pivot_row);
                b[r] -= factor * pivot_b;
            }
        }

        pivot_row_of[col] = Some(next_row);
        next_row += 1;
    }

    Array1::from_iter(
        pivot_row_of
            .iter()
            .map(|row| row.map_or(0.0, |r| b[r])),
    )
}
