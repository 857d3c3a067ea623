use ndarray::ArrayView1;

/// Regression quality on one partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
}

impl RegressionMetrics {
    /// Panics if the two views differ in length or are empty.
    pub fn evaluate(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> Self {
        Self {
            r2: r_squared(y_true, y_pred),
            rmse: mse(y_true, y_pred).sqrt(),
            mae: mae(y_true, y_pred),
        }
    }
}

/// Coefficient of determination.
///
/// A constant target has no variance to explain: a perfect fit scores 1,
/// anything else 0.
pub fn r_squared(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    assert_eq!(y_true.len(), y_pred.len(), "vectors must have same length");
    assert!(!y_true.is_empty(), "vectors cannot be empty");

    let mean = y_true.sum() / y_true.len() as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn mse(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    assert_eq!(y_true.len(), y_pred.len(), "vectors must have same length");
    assert!(!y_true.is_empty(), "vectors cannot be empty");

    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64
}

pub fn mae(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    assert_eq!(y_true.len(), y_pred.len(), "vectors must have same length");
    assert!(!y_true.is_empty(), "vectors cannot be empty");

    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn perfect_prediction() {
        let y = array![1.0, 2.0, 3.0];
        let m = RegressionMetrics::evaluate(y.view(), y.view());
        assert_eq!(m, RegressionMetrics { r2: 1.0, rmse: 0.0, mae: 0.0 });
    }

    #[test]
    fn known_values() {
        let t = array![3.0, -0.5, 2.0, 7.0];
        let p = array![2.5, 0.0, 2.0, 8.0];
        assert!((r_squared(t.view(), p.view()) - 0.948_608_137_044_967_9).abs() < 1e-12);
        assert!((mse(t.view(), p.view()) - 0.375).abs() < 1e-12);
        assert!((mae(t.view(), p.view()) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn constant_target() {
        let t = array![4.0, 4.0];
        assert_eq!(r_squared(t.view(), array![4.0, 4.0].view()), 1.0);
        assert_eq!(r_squared(t.view(), array![4.0, 5.0].view()), 0.0);
    }

    #[test]
    fn mean_prediction_scores_zero() {
        let t = array![1.0, 2.0, 3.0];
        let p = array![2.0, 2.0, 2.0];
        assert!(r_squared(t.view(), p.view()).abs() < 1e-12);
    }
}
