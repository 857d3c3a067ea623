use std::fmt;

use ndarray::{Array1, Array2};

use crate::error::{Error, InputProblem, Result};
use crate::score;

// ---------------------------------------------------------------------------
// Feature – one nutrient column
// ---------------------------------------------------------------------------

/// The nutrient columns the score and the model are built from.
///
/// The declaration order is the canonical feature order used for the
/// feature matrix, the scaler, the model and the nearest-dish distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Calories,
    Protein,
    Carbohydrates,
    FreeSugar,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::Calories,
        Feature::Protein,
        Feature::Carbohydrates,
        Feature::FreeSugar,
    ];

    /// Column header in the source dataset.
    pub fn column(self) -> &'static str {
        match self {
            Feature::Calories => "Calories (kcal)",
            Feature::Protein => "Protein (g)",
            Feature::Carbohydrates => "Carbohydrates (g)",
            Feature::FreeSugar => "Free Sugar (g)",
        }
    }

    /// Field name used in HTTP request and response bodies.
    pub fn api_key(self) -> &'static str {
        match self {
            Feature::Calories => "calories",
            Feature::Protein => "protein",
            Feature::Carbohydrates => "carbs",
            Feature::FreeSugar => "sugar",
        }
    }

    pub fn from_column(name: &str) -> Result<Feature> {
        Feature::ALL
            .into_iter()
            .find(|f| f.column() == name)
            .ok_or_else(|| Error::UnknownFeature(name.to_string()))
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Column holding the dish name.
pub const DISH_NAME_COLUMN: &str = "Dish Name";

// ---------------------------------------------------------------------------
// NutrientVector
// ---------------------------------------------------------------------------

/// Four non-negative nutrient values in [`Feature::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NutrientVector {
    values: [f64; 4],
}

impl NutrientVector {
    /// Build a vector, rejecting negative or non-finite values.
    pub fn try_new(calories: f64, protein: f64, carbohydrates: f64, free_sugar: f64) -> Result<Self> {
        Self::try_from_array([calories, protein, carbohydrates, free_sugar])
    }

    pub fn try_from_array(values: [f64; 4]) -> Result<Self> {
        for (feature, value) in Feature::ALL.into_iter().zip(values) {
            check_nutrient(feature.column(), value)?;
        }
        Ok(Self { values })
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    pub fn calories(&self) -> f64 {
        self.get(Feature::Calories)
    }

    pub fn protein(&self) -> f64 {
        self.get(Feature::Protein)
    }

    pub fn carbohydrates(&self) -> f64 {
        self.get(Feature::Carbohydrates)
    }

    pub fn free_sugar(&self) -> f64 {
        self.get(Feature::FreeSugar)
    }

    pub fn as_array(&self) -> [f64; 4] {
        self.values
    }

    /// Values arranged in an arbitrary feature order (e.g. a stored artifact's).
    pub fn ordered(&self, order: &[Feature]) -> Vec<f64> {
        order.iter().map(|f| self.get(*f)).collect()
    }

    /// Euclidean distance over raw values.
    ///
    /// Accumulated with `hypot`, so huge components never overflow an
    /// intermediate square; a distance beyond `f64::MAX` saturates there.
    pub fn distance(&self, other: &NutrientVector) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .fold(0.0_f64, |acc, (a, b)| acc.hypot(a - b))
            .min(f64::MAX)
    }
}

fn check_nutrient(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(Error::invalid_input(field, InputProblem::NotFinite));
    }
    if value < 0.0 {
        return Err(Error::invalid_input(field, InputProblem::Negative));
    }
    Ok(value)
}

/// Parse one user-supplied nutrient value.
pub fn parse_nutrient(field: &str, raw: &str) -> Result<f64> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::invalid_input(field, InputProblem::NotANumber))?;
    check_nutrient(field, value)
}

// ---------------------------------------------------------------------------
// Dish – one row of the dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Dish {
    pub name: String,
    pub nutrients: NutrientVector,
    /// Derived from `nutrients` on construction.
    pub score: f64,
}

impl Dish {
    pub fn new(name: impl Into<String>, nutrients: NutrientVector) -> Self {
        Dish {
            name: name.into(),
            score: score::score(&nutrients),
            nutrients,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with scores attached.
#[derive(Debug, Clone)]
pub struct Dataset {
    dishes: Vec<Dish>,
    /// Column names as they appeared in the source file.
    column_names: Vec<String>,
}

impl Dataset {
    pub fn new(dishes: Vec<Dish>, column_names: Vec<String>) -> Self {
        Dataset {
            dishes,
            column_names,
        }
    }

    /// Build a dataset with just the canonical columns.
    pub fn from_dishes(dishes: Vec<Dish>) -> Self {
        let mut column_names = vec![DISH_NAME_COLUMN.to_string()];
        column_names.extend(Feature::ALL.iter().map(|f| f.column().to_string()));
        Dataset::new(dishes, column_names)
    }

    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }

    pub fn dishes(&self) -> &[Dish] {
        &self.dishes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dish> {
        self.dishes.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Dish> {
        self.dishes.get(index)
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// All values of one nutrient column, in dataset order.
    pub fn column(&self, feature: Feature) -> Vec<f64> {
        self.dishes.iter().map(|d| d.nutrients.get(feature)).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.dishes.iter().map(|d| d.name.as_str()).collect()
    }

    /// `n × 4` matrix in [`Feature::ALL`] order.
    pub fn feature_matrix(&self) -> Array2<f64> {
        let mut x = Array2::zeros((self.dishes.len(), Feature::ALL.len()));
        for (mut row, dish) in x.rows_mut().into_iter().zip(&self.dishes) {
            for (cell, value) in row.iter_mut().zip(dish.nutrients.as_array()) {
                *cell = value;
            }
        }
        x
    }

    pub fn scores(&self) -> Array1<f64> {
        self.dishes.iter().map(|d| d.score).collect()
    }

    pub fn summary(&self) -> DatasetSummary {
        let n = self.dishes.len();
        let scores: Vec<f64> = self.dishes.iter().map(|d| d.score).collect();
        let (min, max) = scores
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
                (lo.min(s), hi.max(s))
            });
        let mean = if n == 0 {
            0.0
        } else {
            scores.iter().sum::<f64>() / n as f64
        };
        // Sample standard deviation, matching the usual table summaries.
        let std_dev = if n < 2 {
            0.0
        } else {
            (scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
        };
        DatasetSummary {
            records: n,
            columns: self.column_names.len(),
            score_min: if n == 0 { 0.0 } else { min },
            score_max: if n == 0 { 0.0 } else { max },
            score_mean: mean,
            score_std: std_dev,
        }
    }
}

/// Headline numbers printed before training.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetSummary {
    pub records: usize,
    pub columns: usize,
    pub score_min: f64,
    pub score_max: f64,
    pub score_mean: f64,
    pub score_std: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nv(c: f64, p: f64, cb: f64, s: f64) -> NutrientVector {
        NutrientVector::try_new(c, p, cb, s).unwrap()
    }

    #[test]
    fn rejects_negative_and_non_finite_values() {
        let err = NutrientVector::try_new(-1.0, 0.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput { problem: InputProblem::Negative, .. }
        ));
        let err = NutrientVector::try_new(0.0, f64::NAN, 0.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput { problem: InputProblem::NotFinite, .. }
        ));
    }

    #[test]
    fn parse_nutrient_reports_the_problem() {
        assert_eq!(parse_nutrient("Protein (g)", " 12.5 ").unwrap(), 12.5);
        assert!(matches!(
            parse_nutrient("Protein (g)", "abc"),
            Err(Error::InvalidInput { problem: InputProblem::NotANumber, .. })
        ));
        assert!(matches!(
            parse_nutrient("Protein (g)", "-3"),
            Err(Error::InvalidInput { problem: InputProblem::Negative, .. })
        ));
        assert_eq!(parse_nutrient("Protein (g)", "0").unwrap(), 0.0);
    }

    #[test]
    fn feature_lookup_by_column() {
        for f in Feature::ALL {
            assert_eq!(Feature::from_column(f.column()).unwrap(), f);
        }
        assert!(Feature::from_column("Fat (g)").is_err());
    }

    #[test]
    fn ordered_follows_given_feature_order() {
        let v = nv(100.0, 5.0, 30.0, 2.0);
        assert_eq!(
            v.ordered(&[Feature::FreeSugar, Feature::Calories]),
            vec![2.0, 100.0]
        );
    }

    #[test]
    fn feature_matrix_and_columns() {
        let ds = Dataset::from_dishes(vec![
            Dish::new("a", nv(1.0, 2.0, 3.0, 4.0)),
            Dish::new("b", nv(5.0, 6.0, 7.0, 8.0)),
        ]);
        let x = ds.feature_matrix();
        assert_eq!(x.shape(), &[2, 4]);
        assert_eq!(x[[1, 2]], 7.0);
        assert_eq!(ds.column(Feature::Protein), vec![2.0, 6.0]);
        assert_eq!(ds.names(), vec!["a", "b"]);
        assert_eq!(ds.column_names().len(), 5);
    }

    #[test]
    fn summary_uses_sample_std() {
        let ds = Dataset::from_dishes(vec![
            Dish::new("best", nv(0.0, 20.0, 40.0, 0.0)),
            Dish::new("worst", nv(500.0, 0.0, 0.0, 15.0)),
        ]);
        let s = ds.summary();
        assert_eq!(s.records, 2);
        assert!((s.score_max - 100.0).abs() < 1e-9);
        assert!(s.score_min.abs() < 1e-9);
        assert!((s.score_mean - 50.0).abs() < 1e-9);
        assert!((s.score_std - 50.0 * 2f64.sqrt()).abs() < 1e-9);
    }
}
