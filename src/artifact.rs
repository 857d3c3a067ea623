use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::data::model::{Feature, NutrientVector};
use crate::error::Error;
use crate::locate::Locator;
use crate::ml::regression::LinearModel;
use crate::ml::scaler::StandardScaler;

pub const MODEL_FILE: &str = "linear_regression_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const FEATURES_FILE: &str = "features.json";
pub const DISHES_FILE: &str = "dishes.json";

/// Everything one training run produces, as consumed at inference time.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedArtifact {
    /// Column order the scaler and model were fit on.
    pub feature_order: Vec<Feature>,
    pub scaler: StandardScaler,
    pub model: LinearModel,
    /// Names of the dishes in the training partition.
    pub training_dishes: Vec<String>,
}

impl TrainedArtifact {
    /// Unclamped model output for a nutrient vector.
    pub fn predict_raw(&self, nutrients: &NutrientVector) -> crate::error::Result<f64> {
        let row = nutrients.ordered(&self.feature_order);
        let scaled = self.scaler.transform_row(&row)?;
        self.model.predict(&scaled)
    }

    fn check_consistent(&self) -> crate::error::Result<()> {
        let n = self.feature_order.len();
        for got in [self.scaler.n_features(), self.model.coefficients().len()] {
            if got != n {
                return Err(Error::DimensionMismatch { expected: n, got });
            }
        }
        Ok(())
    }

    /// Write the four blobs into `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating models directory {}", dir.display()))?;

        let features: Vec<&str> = self.feature_order.iter().map(|f| f.column()).collect();
        let written = vec![
            write_blob(dir, MODEL_FILE, &self.model)?,
            write_blob(dir, SCALER_FILE, &self.scaler)?,
            write_blob(dir, FEATURES_FILE, &features)?,
            write_blob(dir, DISHES_FILE, &self.training_dishes)?,
        ];
        Ok(written)
    }

    /// Locate each blob across `dirs` (first hit per blob) and load them.
    ///
    /// The model, scaler and feature list are required; a missing one yields
    /// [`Error::MissingArtifact`]. The dish list is optional.
    pub fn load(dirs: &[PathBuf]) -> Result<Self> {
        let model: LinearModel = read_blob(&require(dirs, MODEL_FILE)?)?;
        let scaler: StandardScaler = read_blob(&require(dirs, SCALER_FILE)?)?;
        let columns: Vec<String> = read_blob(&require(dirs, FEATURES_FILE)?)?;
        let feature_order = columns
            .iter()
            .map(|c| Feature::from_column(c))
            .collect::<crate::error::Result<Vec<_>>>()?;

        let training_dishes = match Locator::in_dirs(dirs, DISHES_FILE).find() {
            Some(path) => read_blob(path)?,
            None => {
                log::debug!("{DISHES_FILE} not found; continuing without training dish names");
                Vec::new()
            }
        };

        let artifact = TrainedArtifact {
            feature_order,
            scaler,
            model,
            training_dishes,
        };
        artifact.check_consistent()?;
        Ok(artifact)
    }
}

fn require(dirs: &[PathBuf], file: &'static str) -> Result<PathBuf> {
    let locator = Locator::in_dirs(dirs, file);
    match locator.find() {
        Some(path) => Ok(path.to_path_buf()),
        None => Err(Error::MissingArtifact {
            file,
            searched: locator.candidates().to_vec(),
        }
        .into()),
    }
}

fn write_blob<T: Serialize + ?Sized>(dir: &Path, file: &str, value: &T) -> Result<PathBuf> {
    let path = dir.join(file);
    let text = serde_json::to_string_pretty(value).with_context(|| format!("serializing {file}"))?;
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Saved {}", path.display());
    Ok(path)
}

fn read_blob<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn artifact() -> TrainedArtifact {
        let x = array![[100.0, 5.0, 20.0, 1.0], [300.0, 15.0, 60.0, 8.0], [50.0, 1.0, 35.0, 0.0]];
        TrainedArtifact {
            feature_order: Feature::ALL.to_vec(),
            scaler: StandardScaler::fit(x.view()).unwrap(),
            model: LinearModel::new(vec![1.0, 2.0, -0.5, -3.0], 55.0),
            training_dishes: vec!["Dal".into(), "Kheer".into()],
        }
    }

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() <= 1e-12 * y.abs().max(1.0), "{x} != {y}");
        }
    }

    #[test]
    fn save_then_load_from_search_path() {
        let root = tempfile::tempdir().unwrap();
        let models = root.path().join("models");
        let art = artifact();
        let written = art.save(&models).unwrap();
        assert_eq!(written.len(), 4);

        let dirs = vec![root.path().join("elsewhere"), models.clone()];
        let loaded = TrainedArtifact::load(&dirs).unwrap();
        assert_eq!(loaded.feature_order, art.feature_order);
        assert_eq!(loaded.training_dishes, art.training_dishes);
        assert_close(loaded.scaler.mean(), art.scaler.mean());
        assert_close(loaded.scaler.std(), art.scaler.std());
        assert_close(loaded.model.coefficients(), art.model.coefficients());
        assert_close(&[loaded.model.intercept()], &[art.model.intercept()]);

        let features: Vec<String> =
            serde_json::from_str(&fs::read_to_string(models.join(FEATURES_FILE)).unwrap()).unwrap();
        assert_eq!(features[0], "Calories (kcal)");
    }

    #[test]
    fn missing_blob_is_a_missing_artifact() {
        let root = tempfile::tempdir().unwrap();
        let err = TrainedArtifact::load(&[root.path().to_path_buf()]).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::MissingArtifact { file, searched }) => {
                assert_eq!(*file, MODEL_FILE);
                assert_eq!(searched.len(), 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn dishes_blob_is_optional() {
        let root = tempfile::tempdir().unwrap();
        artifact().save(root.path()).unwrap();
        fs::remove_file(root.path().join(DISHES_FILE)).unwrap();
        let loaded = TrainedArtifact::load(&[root.path().to_path_buf()]).unwrap();
        assert!(loaded.training_dishes.is_empty());
    }

    #[test]
    fn inconsistent_blobs_are_rejected() {
        let root = tempfile::tempdir().unwrap();
        artifact().save(root.path()).unwrap();
        fs::write(root.path().join(FEATURES_FILE), r#"["Calories (kcal)", "Protein (g)"]"#).unwrap();
        assert!(TrainedArtifact::load(&[root.path().to_path_buf()]).is_err());

        fs::write(root.path().join(FEATURES_FILE), r#"["Fat (g)"]"#).unwrap();
        assert!(TrainedArtifact::load(&[root.path().to_path_buf()]).is_err());
    }

    #[test]
    fn predict_raw_applies_scaler_then_model() {
        let art = artifact();
        let n = NutrientVector::try_new(150.0, 7.0, 38.0, 3.0).unwrap();
        let expected = art
            .model
            .predict(&art.scaler.transform_row(&n.as_array()).unwrap())
            .unwrap();
        assert_eq!(art.predict_raw(&n).unwrap(), expected);
    }
}
