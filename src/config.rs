use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::pipeline::{DEFAULT_SEED, DEFAULT_TEST_SIZE};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "nutriscore.json";

/// Paths and knobs shared by the `train`, `predict` and `serve` commands.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```json
/// { "models_dir": "out/models", "test_size": 0.25, "bind": "0.0.0.0:8080" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset candidates, first existing file wins.
    pub dataset_paths: Vec<PathBuf>,
    /// Where `train` writes the artifact blobs.
    pub models_dir: PathBuf,
    /// Where `predict` and `serve` look for the blobs, in order.
    pub artifact_dirs: Vec<PathBuf>,
    pub test_size: f64,
    pub seed: u64,
    pub bind: String,
    /// Static front end served next to the API when the directory exists.
    pub static_dir: Option<PathBuf>,
    /// Nearest dishes shown with a prediction.
    pub match_count: usize,
    pub cli_search_limit: usize,
    pub api_search_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dataset_paths: vec![
                PathBuf::from("Indian_Food_Nutrition_Processed.csv"),
                PathBuf::from("data/Indian_Food_Nutrition_Processed.csv"),
                PathBuf::from("Indian_Food_Nutrition_Processed.parquet"),
            ],
            models_dir: PathBuf::from("models"),
            artifact_dirs: vec![
                PathBuf::from("models"),
                PathBuf::from("outputs/models"),
                PathBuf::from("."),
            ],
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
            bind: "127.0.0.1:5000".to_string(),
            static_dir: Some(PathBuf::from("frontend")),
            match_count: 2,
            cli_search_limit: 5,
            api_search_limit: 10,
        }
    }
}

impl Config {
    /// Load `path` if given (it must exist), else `nutriscore.json` if present,
    /// else defaults.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) => Config::from_file(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Config::from_file(fallback)
                } else {
                    log::debug!("No {DEFAULT_CONFIG_FILE}; using built-in defaults");
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Put an explicitly requested dataset ahead of the configured candidates.
    pub fn prefer_dataset(&mut self, path: PathBuf) {
        self.dataset_paths.retain(|p| p != &path);
        self.dataset_paths.insert(0, path);
    }

    /// Use `dir` for writing and search it before the other artifact dirs.
    pub fn prefer_models_dir(&mut self, dir: PathBuf) {
        self.artifact_dirs.retain(|p| p != &dir);
        self.artifact_dirs.insert(0, dir.clone());
        self.models_dir = dir;
    }
}
