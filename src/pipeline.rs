use ndarray::Axis;

use crate::artifact::TrainedArtifact;
use crate::data::model::{Dataset, Feature};
use crate::error::{Error, Result};
use crate::ml::metrics::RegressionMetrics;
use crate::ml::regression::LinearModel;
use crate::ml::scaler::StandardScaler;
use crate::ml::split::{SplitIndices, train_test_split};

pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

/// Train and test metrics side by side. A large gap between them points at
/// overfitting; the pipeline only reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReport {
    pub train_samples: usize,
    pub test_samples: usize,
    pub train: RegressionMetrics,
    pub test: RegressionMetrics,
}

impl EvaluationReport {
    pub fn r2_gap(&self) -> f64 {
        self.train.r2 - self.test.r2
    }
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: TrainedArtifact,
    pub report: EvaluationReport,
    pub split: SplitIndices,
}

/// split → scale → fit → evaluate.
#[derive(Debug, Clone, Copy)]
pub struct TrainingPipeline {
    test_size: f64,
    seed: u64,
}

impl Default for TrainingPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_TEST_SIZE, DEFAULT_SEED)
    }
}

impl TrainingPipeline {
    pub fn new(test_size: f64, seed: u64) -> Self {
        Self { test_size, seed }
    }

    pub fn run(&self, dataset: &Dataset) -> Result<TrainingOutcome> {
        if dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let x = dataset.feature_matrix();
        let y = dataset.scores();

        let split = train_test_split(dataset.len(), self.test_size, self.seed)?;
        log::info!(
            "Split {} dishes into {} train / {} test (seed {})",
            dataset.len(),
            split.train.len(),
            split.test.len(),
            self.seed
        );

        let x_train = x.select(Axis(0), &split.train);
        let x_test = x.select(Axis(0), &split.test);
        let y_train = y.select(Axis(0), &split.train);
        let y_test = y.select(Axis(0), &split.test);

        // Only training rows ever reach `fit`.
        let scaler = StandardScaler::fit(x_train.view())?;
        let x_train_scaled = scaler.transform(x_train.view())?;
        let x_test_scaled = scaler.transform(x_test.view())?;

        let model = LinearModel::fit(x_train_scaled.view(), y_train.view())?;
        log::info!(
            "Fitted linear model: coefficients {:?}, intercept {:.4}",
            model.coefficients(),
            model.intercept()
        );

        let train_pred = model.predict_batch(x_train_scaled.view())?;
        let test_pred = model.predict_batch(x_test_scaled.view())?;

        let report = EvaluationReport {
            train_samples: split.train.len(),
            test_samples: split.test.len(),
            train: RegressionMetrics::evaluate(y_train.view(), train_pred.view()),
            test: RegressionMetrics::evaluate(y_test.view(), test_pred.view()),
        };

        let training_dishes = split
            .train
            .iter()
            .filter_map(|&i| dataset.get(i))
            .map(|d| d.name.clone())
            .collect();

        let artifact = TrainedArtifact {
            feature_order: Feature::ALL.to_vec(),
            scaler,
            model,
            training_dishes,
        };

        Ok(TrainingOutcome {
            artifact,
            report,
            split,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Dish, NutrientVector};
    use crate::score;

    fn dish(name: &str, c: f64, p: f64, cb: f64, s: f64) -> Dish {
        Dish::new(name, NutrientVector::try_new(c, p, cb, s).unwrap())
    }

    /// Deterministic spread of dishes over the nutrient ranges.
    fn synthetic(n: usize) -> Dataset {
        let dishes = (0..n)
            .map(|i| {
                let t = i as f64;
                dish(
                    &format!("dish {i}"),
                    (t * 37.0) % 600.0,
                    (t * 7.3) % 30.0,
                    (t * 13.1) % 90.0,
                    (t * 3.7) % 20.0,
                )
            })
            .collect();
        Dataset::from_dishes(dishes)
    }

    #[test]
    fn tiny_dataset_reproduces_training_scores() {
        let ds = Dataset::from_dishes(vec![
            dish("Dal", 120.0, 9.0, 18.0, 1.0),
            dish("Kheer", 310.0, 6.0, 52.0, 14.0),
            dish("Paneer Tikka", 260.0, 18.0, 8.0, 2.0),
        ]);
        let outcome = TrainingPipeline::default().run(&ds).unwrap();
        assert_eq!(outcome.split.train.len(), 2);
        assert_eq!(outcome.artifact.training_dishes.len(), 2);

        for &i in &outcome.split.train {
            let d = ds.get(i).unwrap();
            let predicted = outcome.artifact.predict_raw(&d.nutrients).unwrap();
            assert!(
                (predicted - score::score(&d.nutrients)).abs() < 1e-6,
                "{}: predicted {predicted}, actual {}",
                d.name,
                d.score
            );
        }
    }

    #[test]
    fn report_counts_and_sane_metrics() {
        let ds = synthetic(50);
        let outcome = TrainingPipeline::new(0.2, 42).run(&ds).unwrap();
        let r = outcome.report;
        assert_eq!(r.train_samples, 40);
        assert_eq!(r.test_samples, 10);
        for m in [r.train, r.test] {
            assert!(m.r2 <= 1.0);
            assert!(m.rmse.is_finite() && m.rmse >= 0.0);
            assert!(m.mae.is_finite() && m.mae >= 0.0);
            assert!(m.mae <= m.rmse + 1e-12);
        }
        // OLS with an intercept never does worse than the mean on its own data.
        assert!(r.train.r2 >= 0.0);
        assert!(r.r2_gap().is_finite());
    }

    #[test]
    fn scaler_ignores_test_rows() {
        let ds = synthetic(40);
        let pipeline = TrainingPipeline::new(0.25, 9);
        let first = pipeline.run(&ds).unwrap();

        let mut dishes = ds.dishes().to_vec();
        for &i in &first.split.test {
            dishes[i] = dish("perturbed", 5000.0, 900.0, 777.0, 300.0);
        }
        let second = pipeline.run(&Dataset::from_dishes(dishes)).unwrap();

        assert_eq!(first.split, second.split);
        assert_eq!(first.artifact.scaler, second.artifact.scaler);
        assert_eq!(first.artifact.model, second.artifact.model);
    }

    #[test]
    fn training_dishes_follow_train_partition() {
        let ds = synthetic(20);
        let outcome = TrainingPipeline::default().run(&ds).unwrap();
        let expected: Vec<String> = outcome
            .split
            .train
            .iter()
            .map(|&i| ds.dishes()[i].name.clone())
            .collect();
        assert_eq!(outcome.artifact.training_dishes, expected);
    }

    #[test]
    fn empty_dataset_fails() {
        let err = TrainingPipeline::default()
            .run(&Dataset::from_dishes(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
    }

    #[test]
    fn single_dish_cannot_be_split() {
        let ds = Dataset::from_dishes(vec![dish("only", 1.0, 1.0, 1.0, 1.0)]);
        assert!(matches!(
            TrainingPipeline::default().run(&ds),
            Err(Error::InvalidSplit { .. })
        ));
    }
}
