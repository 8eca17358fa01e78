//! Gluco Model - Diabetes risk classifier
//!
//! Loads the binary classifier the service predicts with. The model is an
//! opaque collaborator: it sees only complete [`FeatureVector`]s in schema
//! order and answers 0 or 1.
//!
//! [`FeatureVector`]: gluco_core::FeatureVector

pub mod forest;

pub use forest::{ForestModel, Node, Tree, DECISION_THRESHOLD};

use std::path::Path;
use std::sync::Arc;

use gluco_core::{GlucoError, Predictor};
use thiserror::Error;

/// Errors raised while loading a model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    Invalid(String),
}

impl From<ModelError> for GlucoError {
    fn from(err: ModelError) -> Self {
        GlucoError::ModelError(err.to_string())
    }
}

/// Load a forest model from a JSON file
pub fn load_forest(path: &Path) -> Result<ForestModel, ModelError> {
    let json = std::fs::read_to_string(path).map_err(|e| ModelError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    ForestModel::from_json(&json)
}

/// Load the predictor if a model file is present
///
/// A missing file is not an error: the service runs without a predictor and
/// reports prediction requests as unavailable. A file that exists but cannot
/// be loaded is an error.
pub fn load_predictor(path: &Path) -> gluco_core::Result<Option<Arc<dyn Predictor>>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Model file not found; predictions disabled");
        return Ok(None);
    }

    let model = load_forest(path)?;
    tracing::info!(
        path = %path.display(),
        model = model.name(),
        trees = model.num_trees(),
        "Loaded prediction model"
    );
    Ok(Some(Arc::new(model)))
}
