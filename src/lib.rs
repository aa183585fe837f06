//! Library root for the `campaign_scorer` crate
//! Scores campaign acceptance after reconciling loosely-typed customer
//! records against the feature schema of a trained pipeline.

// Core error handling
pub mod errors;

// Records and the model boundary
pub mod model;
pub mod pipeline_artifact;
pub mod record;

// Input reconciliation
pub mod feature_deriver;
pub mod feature_schema;
pub mod feature_vector;
pub mod input_completer;

// Orchestration
pub mod scoring_service;

// Configuration & CLI
pub mod cli;
pub mod config_loader;

// Web server interface
pub mod api_errors;
pub mod web;

// Logging
pub mod log_sink;

pub use feature_schema::FeatureSchema;
pub use feature_vector::FeatureVector;
pub use scoring_service::{LoadedModel, Prediction, ScoringService};
