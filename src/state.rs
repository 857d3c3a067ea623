use crate::artifact::TrainedArtifact;
use crate::config::Config;
use crate::data::filter::search_by_name;
use crate::data::loader::load_file;
use crate::data::model::{Dataset, Dish, Feature, NutrientVector};
use crate::data::nearest::{Neighbor, find_nearest};
use crate::error::{Error, Result};
use crate::locate::Locator;
use crate::score::ScoreCategory;

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// A model output clamped to the score range, with its band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub score: f64,
    pub category: ScoreCategory,
}

impl Prediction {
    pub fn from_raw(raw: f64) -> Self {
        let score = raw.clamp(0.0, 100.0);
        Prediction {
            score,
            category: ScoreCategory::from_score(score),
        }
    }
}

// ---------------------------------------------------------------------------
// Predictor – what the CLI menu and the HTTP handlers share
// ---------------------------------------------------------------------------

/// Trained artifact and reference dataset, loaded once and read-only after.
///
/// Either half may be absent: without the artifact nothing can be predicted,
/// without the dataset predictions still work but matches and name search
/// report the dataset as unavailable.
#[derive(Debug, Default)]
pub struct Predictor {
    artifact: Option<TrainedArtifact>,
    dataset: Option<Dataset>,
}

impl Predictor {
    pub fn new(artifact: Option<TrainedArtifact>, dataset: Option<Dataset>) -> Self {
        Predictor { artifact, dataset }
    }

    /// Resolve and load both halves using the configured search paths.
    /// Failures are logged and leave the corresponding half empty.
    pub fn load(config: &Config) -> Self {
        let artifact = match TrainedArtifact::load(&config.artifact_dirs) {
            Ok(artifact) => {
                log::info!(
                    "Loaded trained model ({} features, {} training dishes)",
                    artifact.feature_order.len(),
                    artifact.training_dishes.len()
                );
                Some(artifact)
            }
            Err(e) => {
                log::warn!("Model unavailable: {e:#}");
                None
            }
        };

        let dataset = match load_dataset(config) {
            Ok(dataset) => Some(dataset),
            Err(e) => {
                log::warn!("Dataset unavailable: {e:#}");
                None
            }
        };

        Predictor::new(artifact, dataset)
    }

    pub fn has_model(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn feature_order(&self) -> Option<&[Feature]> {
        self.artifact.as_ref().map(|a| a.feature_order.as_slice())
    }

    pub fn predict(&self, nutrients: &NutrientVector) -> Result<Prediction> {
        let artifact = self.artifact.as_ref().ok_or(Error::ModelUnavailable)?;
        let raw = artifact.predict_raw(nutrients)?;
        Ok(Prediction::from_raw(raw))
    }

    pub fn nearest(&self, nutrients: &NutrientVector, k: usize) -> Result<Vec<Neighbor<'_>>> {
        let dataset = self.dataset.as_ref().ok_or(Error::DatasetUnavailable)?;
        Ok(find_nearest(nutrients, dataset.dishes(), k))
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<&Dish>> {
        let dataset = self.dataset.as_ref().ok_or(Error::DatasetUnavailable)?;
        Ok(search_by_name(dataset, query, limit))
    }
}

/// First existing configured dataset path, loaded.
pub fn load_dataset(config: &Config) -> anyhow::Result<Dataset> {
    let locator = Locator::new(config.dataset_paths.iter().cloned());
    let path = locator.find().ok_or_else(|| Error::MissingDataset {
        searched: locator.candidates().to_vec(),
    })?;
    load_file(path)
}
