//! Error types for the campaign scorer
//!
//! Model load failures propagate to `main` and stop the process. Request-path
//! failures are folded into a `Prediction::Failure` by the scoring service
//! and never reach the transport as faults.

use crate::model::ModelError;
use thiserror::Error;

/// Main error type for the scoring service
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Failed to load model artifact {path}: {source}")]
    ModelLoad {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Feature schema unavailable: the loaded model exposes no input columns")]
    SchemaUnavailable,

    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },

    #[error("Model {model_id} failed to score: {message}")]
    Model { model_id: String, message: String },
}

/// Result alias used across the crate
pub type ScoringResult<T> = Result<T, ScoringError>;

impl ScoringError {
    /// Create a model load error
    pub fn model_load(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ModelLoad {
            path: path.into(),
            source: Box::new(source),
        }
    }

    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Create a scoring failure attributed to a model
    pub fn model(model_id: impl Into<String>, source: ModelError) -> Self {
        Self::Model {
            model_id: model_id.into(),
            message: source.to_string(),
        }
    }
}
