use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result type for the scoring, training and lookup core.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a nutrient value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputProblem {
    NotANumber,
    NotFinite,
    Negative,
    NotAnObject,
}

impl fmt::Display for InputProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputProblem::NotANumber => write!(f, "not a number"),
            InputProblem::NotFinite => write!(f, "must be a finite number"),
            InputProblem::Negative => write!(f, "must not be negative"),
            InputProblem::NotAnObject => write!(f, "must be a JSON object"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid value for {field}: {problem}")]
    InvalidInput { field: String, problem: InputProblem },

    #[error("trained model is not loaded; run `nutriscore train` first")]
    ModelUnavailable,

    #[error("dataset is not loaded")]
    DatasetUnavailable,

    #[error("artifact file {file} not found (searched {})", display_paths(.searched))]
    MissingArtifact {
        file: &'static str,
        searched: Vec<PathBuf>,
    },

    #[error("dataset not found (searched {})", display_paths(.searched))]
    MissingDataset { searched: Vec<PathBuf> },

    #[error("dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("cannot split {samples} samples with test size {test_size}")]
    InvalidSplit { samples: usize, test_size: f64 },

    #[error("dimension mismatch: expected {expected} values, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("unknown feature column '{0}'")]
    UnknownFeature(String),
}

impl Error {
    pub fn invalid_input(field: impl Into<String>, problem: InputProblem) -> Self {
        Error::InvalidInput {
            field: field.into(),
            problem,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
