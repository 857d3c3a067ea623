use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Standard deviations at or below this are treated as zero variance.
const MIN_STD: f64 = 1e-12;

/// Per-feature standardization, `z = (x - mean) / std`.
///
/// A scaler only comes into existence through [`StandardScaler::fit`] (or by
/// loading saved parameters) and cannot be refit afterwards; data that is not
/// training data only ever goes through `transform`.
///
/// Features with zero variance are stored with `std = 1`, so they map to
/// `x - mean` instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl StandardScaler {
    /// Compute mean and population standard deviation of each column.
    pub fn fit(x: ArrayView2<'_, f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(Error::EmptyDataset);
        }
        let mean = x
            .mean_axis(Axis(0))
            .ok_or(Error::EmptyDataset)?
            .to_vec();
        let std = x
            .std_axis(Axis(0), 0.0)
            .iter()
            .map(|&s| if s > MIN_STD { s } else { 1.0 })
            .collect();
        Ok(Self { mean, std })
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std(&self) -> &[f64] {
        &self.std
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            for ((v, m), s) in row.iter_mut().zip(&self.mean).zip(&self.std) {
                *v = (*v - m) / s;
            }
        }
        Ok(out)
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(&self.mean)
            .zip(&self.std)
            .map(|((v, m), s)| (v - m) / s)
            .collect())
    }

    pub fn inverse_transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(&self.mean)
            .zip(&self.std)
            .map(|((z, m), s)| z * s + m)
            .collect())
    }

    fn check_width(&self, got: usize) -> Result<()> {
        if got != self.mean.len() {
            return Err(Error::DimensionMismatch {
                expected: self.mean.len(),
                got,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn fit_uses_population_statistics() {
        let x = array![[1.0, 100.0], [2.0, 200.0], [3.0, 300.0], [4.0, 400.0]];
        let scaler = StandardScaler::fit(x.view()).unwrap();
        assert_eq!(scaler.mean(), &[2.5, 250.0]);
        assert!((scaler.std()[0] - 1.25f64.sqrt()).abs() < 1e-12);

        let z = scaler.transform(x.view()).unwrap();
        for col in z.columns() {
            assert!(col.mean().unwrap().abs() < 1e-12);
            assert!((col.std(0.0) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_variance_feature_is_centered_only() {
        let x = array![[5.0, 1.0], [5.0, 3.0]];
        let scaler = StandardScaler::fit(x.view()).unwrap();
        assert_eq!(scaler.std()[0], 1.0);
        let z = scaler.transform_row(&[7.0, 2.0]).unwrap();
        assert_eq!(z, vec![2.0, 0.0]);
        assert!(z.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn round_trip_within_tolerance() {
        let x = array![[120.0, 4.0, 30.0, 2.0], [450.0, 18.0, 70.0, 9.0], [60.0, 1.0, 12.0, 0.0]];
        let scaler = StandardScaler::fit(x.view()).unwrap();
        let z = [0.3, -1.2, 2.5, 0.0];
        let back = scaler
            .transform_row(&scaler.inverse_transform_row(&z).unwrap())
            .unwrap();
        for (a, b) in z.iter().zip(&back) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn width_mismatch_and_empty_input() {
        let x = array![[1.0, 2.0]];
        let scaler = StandardScaler::fit(x.view()).unwrap();
        assert!(matches!(
            scaler.transform_row(&[1.0]),
            Err(Error::DimensionMismatch { expected: 2, got: 1 })
        ));
        let empty = Array2::<f64>::zeros((0, 2));
        assert!(StandardScaler::fit(empty.view()).is_err());
    }
}
