//! Heuristic nutritional score and the category bands shown to users.
//!
//! The score is a weighted sum of four sub-scores, each in `[0, 100]`:
//!
//! | nutrient      | weight | shape                                   |
//! |---------------|--------|-----------------------------------------|
//! | protein       | 0.35   | higher is better, saturates at 20 g     |
//! | calories      | 0.25   | lower is better, floor at 500 kcal      |
//! | carbohydrates | 0.25   | plateau at 30–50 g, linear falloff      |
//! | free sugar    | 0.15   | lower is better, floor at 15 g          |

use std::fmt;

use serde::{Serialize, Serializer};

use crate::data::model::NutrientVector;

const PROTEIN_WEIGHT: f64 = 0.35;
const CALORIE_WEIGHT: f64 = 0.25;
const CARB_WEIGHT: f64 = 0.25;
const SUGAR_WEIGHT: f64 = 0.15;

const PROTEIN_CEILING: f64 = 20.0;
const CALORIE_CEILING: f64 = 500.0;
const SUGAR_CEILING: f64 = 15.0;
const CARB_RANGE_LOW: f64 = 30.0;
const CARB_RANGE_HIGH: f64 = 50.0;
const CARB_FALLOFF: f64 = 30.0;

/// Score a nutrient vector. Always in `[0, 100]`.
pub fn score(n: &NutrientVector) -> f64 {
    let total = protein_subscore(n.protein()) * PROTEIN_WEIGHT
        + calorie_subscore(n.calories()) * CALORIE_WEIGHT
        + carbohydrate_subscore(n.carbohydrates()) * CARB_WEIGHT
        + sugar_subscore(n.free_sugar()) * SUGAR_WEIGHT;
    total.clamp(0.0, 100.0)
}

pub fn protein_subscore(protein: f64) -> f64 {
    (protein.min(PROTEIN_CEILING) / PROTEIN_CEILING * 100.0).clamp(0.0, 100.0)
}

pub fn calorie_subscore(calories: f64) -> f64 {
    ((1.0 - calories.min(CALORIE_CEILING) / CALORIE_CEILING) * 100.0).clamp(0.0, 100.0)
}

pub fn carbohydrate_subscore(carbs: f64) -> f64 {
    let raw = if (CARB_RANGE_LOW..=CARB_RANGE_HIGH).contains(&carbs) {
        100.0
    } else if carbs < CARB_RANGE_LOW {
        carbs / CARB_RANGE_LOW * 100.0
    } else {
        (100.0 - (carbs - CARB_RANGE_HIGH) / CARB_FALLOFF * 100.0).max(0.0)
    };
    raw.clamp(0.0, 100.0)
}

pub fn sugar_subscore(sugar: f64) -> f64 {
    ((1.0 - sugar.min(SUGAR_CEILING) / SUGAR_CEILING) * 100.0).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Category bands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreCategory {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl ScoreCategory {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ScoreCategory::Excellent
        } else if score >= 70.0 {
            ScoreCategory::VeryGood
        } else if score >= 60.0 {
            ScoreCategory::Good
        } else if score >= 50.0 {
            ScoreCategory::Fair
        } else if score >= 40.0 {
            ScoreCategory::Poor
        } else {
            ScoreCategory::VeryPoor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreCategory::Excellent => "Excellent",
            ScoreCategory::VeryGood => "Very Good",
            ScoreCategory::Good => "Good",
            ScoreCategory::Fair => "Fair",
            ScoreCategory::Poor => "Poor",
            ScoreCategory::VeryPoor => "Very Poor",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ScoreCategory::Excellent => "Outstanding nutritional quality!",
            ScoreCategory::VeryGood => "Very good nutritional value",
            ScoreCategory::Good => "Good nutritional quality",
            ScoreCategory::Fair => "Moderate nutritional quality",
            ScoreCategory::Poor => "Low nutritional quality",
            ScoreCategory::VeryPoor => "Very low nutritional quality",
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ScoreCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nv(calories: f64, protein: f64, carbs: f64, sugar: f64) -> NutrientVector {
        NutrientVector::try_new(calories, protein, carbs, sugar).unwrap()
    }

    #[test]
    fn all_subscores_maximal() {
        assert!((score(&nv(0.0, 20.0, 40.0, 0.0)) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn all_subscores_minimal() {
        assert!(score(&nv(500.0, 0.0, 0.0, 15.0)).abs() < 1e-9);
    }

    #[test]
    fn score_stays_in_range_over_a_grid() {
        let values = [0.0, 0.5, 10.0, 29.9, 30.0, 50.0, 51.0, 79.0, 80.0, 150.0, 499.0, 1e4];
        for &c in &values {
            for &p in &values {
                for &cb in &values {
                    for &s in &values {
                        let v = score(&nv(c, p, cb, s));
                        assert!((0.0..=100.0).contains(&v), "score {v} out of range");
                    }
                }
            }
        }
    }

    #[test]
    fn carbohydrate_plateau() {
        for carbs in [30.0, 35.5, 40.0, 49.99, 50.0] {
            assert_eq!(carbohydrate_subscore(carbs), 100.0);
        }
    }

    #[test]
    fn carbohydrate_decreases_away_from_plateau() {
        let below = [29.0, 20.0, 10.0, 1.0, 0.0];
        for pair in below.windows(2) {
            assert!(carbohydrate_subscore(pair[0]) > carbohydrate_subscore(pair[1]));
        }
        let above = [51.0, 60.0, 70.0, 79.0];
        for pair in above.windows(2) {
            assert!(carbohydrate_subscore(pair[0]) > carbohydrate_subscore(pair[1]));
        }
        assert_eq!(carbohydrate_subscore(80.0), 0.0);
        assert_eq!(carbohydrate_subscore(200.0), 0.0);
    }

    #[test]
    fn ceilings_saturate() {
        assert_eq!(protein_subscore(45.0), 100.0);
        assert_eq!(calorie_subscore(900.0), 0.0);
        assert_eq!(sugar_subscore(40.0), 0.0);
    }

    #[test]
    fn zero_carbs_forfeit_only_their_weight() {
        // Everything maxed except carbohydrates.
        let v = score(&nv(0.0, 20.0, 0.0, 0.0));
        assert!((v - (35.0 + 25.0 + 15.0)).abs() < 1e-9);
    }

    #[test]
    fn category_bands() {
        assert_eq!(ScoreCategory::from_score(100.0), ScoreCategory::Excellent);
        assert_eq!(ScoreCategory::from_score(80.0), ScoreCategory::Excellent);
        assert_eq!(ScoreCategory::from_score(79.99), ScoreCategory::VeryGood);
        assert_eq!(ScoreCategory::from_score(70.0), ScoreCategory::VeryGood);
        assert_eq!(ScoreCategory::from_score(60.0), ScoreCategory::Good);
        assert_eq!(ScoreCategory::from_score(50.0), ScoreCategory::Fair);
        assert_eq!(ScoreCategory::from_score(40.0), ScoreCategory::Poor);
        assert_eq!(ScoreCategory::from_score(39.9), ScoreCategory::VeryPoor);
        assert_eq!(ScoreCategory::from_score(0.0), ScoreCategory::VeryPoor);
        assert_eq!(ScoreCategory::VeryGood.to_string(), "Very Good");
    }
}
