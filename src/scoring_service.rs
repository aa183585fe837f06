//! scoring_service.rs
//! Orchestrates one prediction: derive engineered features, reconcile the
//! record against the model's schema, score, and report a uniform result.

use crate::errors::{ScoringError, ScoringResult};
use crate::feature_deriver::FeatureDeriver;
use crate::feature_schema::FeatureSchema;
use crate::feature_vector::FeatureVector;
use crate::input_completer::{normalize_flags, InputCompleter};
use crate::model::{ModelError, ScoringModel};
use crate::pipeline_artifact::PipelineArtifact;

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// A model together with the schema introspected from it.
///
/// Both are immutable once built; replacing a model means building a new
/// `LoadedModel` so model and schema always change together.
pub struct LoadedModel {
    model: Box<dyn ScoringModel>,
    schema: Arc<FeatureSchema>,
    sha256: Option<String>,
}

impl LoadedModel {
    pub fn new(model: Box<dyn ScoringModel>) -> Self {
        let schema = Arc::new(FeatureSchema::introspect(model.as_ref()));
        Self {
            model,
            schema,
            sha256: None,
        }
    }

    /// Load a JSON pipeline artifact. Any failure here is fatal to startup.
    pub fn from_file(path: &Path) -> ScoringResult<Self> {
        let shown = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| ScoringError::model_load(&shown, e))?;
        let artifact = PipelineArtifact::from_slice(&shown, &bytes)?;
        let digest = format!("{:x}", Sha256::digest(&bytes));

        let mut loaded = Self::new(Box::new(artifact));
        info!(
            path = %shown,
            model_id = loaded.model.model_id(),
            sha256 = %digest,
            numeric = loaded.schema.numeric_columns().len(),
            categorical = loaded.schema.categorical_columns().len(),
            "loaded model artifact"
        );
        if loaded.schema.is_empty() {
            warn!("model exposes no input columns; predictions will fail until it is replaced");
        }
        loaded.sha256 = Some(digest);
        Ok(loaded)
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn sha256(&self) -> Option<&str> {
        self.sha256.as_deref()
    }
}

/// Outcome of a prediction request. Failures are values, not faults.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Success { probability: f64 },
    Failure { error: String },
}

impl Prediction {
    pub fn is_success(&self) -> bool {
        matches!(self, Prediction::Success { .. })
    }
}

/// Shared, read-only scoring pipeline.
pub struct ScoringService {
    model: Arc<LoadedModel>,
    deriver: FeatureDeriver,
    completer: InputCompleter,
}

impl ScoringService {
    pub fn new(model: LoadedModel, deriver: FeatureDeriver) -> Self {
        Self {
            model: Arc::new(model),
            deriver,
            completer: InputCompleter,
        }
    }

    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.model.schema
    }

    /// Derive and reconcile `payload` without scoring it.
    pub fn prepare(&self, payload: Value) -> ScoringResult<FeatureVector> {
        let Value::Object(mut record) = payload else {
            return Err(ScoringError::invalid_record("payload must be a JSON object"));
        };
        if self.model.schema.is_empty() {
            return Err(ScoringError::SchemaUnavailable);
        }

        normalize_flags(&mut record);
        let enriched = self.deriver.derive(record);
        Ok(self.completer.complete(enriched, &self.model.schema))
    }

    /// Probability of acceptance, in [0, 1] and rounded to 4 decimals.
    pub fn score(&self, payload: Value) -> ScoringResult<f64> {
        let row = self.prepare(payload)?;
        let model = &self.model.model;
        let proba = model
            .predict_proba(&row)
            .map_err(|e| ScoringError::model(model.model_id(), e))?;

        let accept = proba.get(1).copied().ok_or_else(|| ScoringError::Model {
            model_id: model.model_id().to_string(),
            message: format!("expected two class probabilities, got {}", proba.len()),
        })?;
        if !accept.is_finite() {
            return Err(ScoringError::model(model.model_id(), ModelError::NonFinite));
        }
        Ok(round4(accept.clamp(0.0, 1.0)))
    }

    /// Score `payload`, converting every failure into `Prediction::Failure`.
    pub fn predict(&self, payload: Value) -> Prediction {
        let request_id = Uuid::new_v4();
        let span = info_span!("predict", %request_id, model_id = self.model.model_id());
        let _guard = span.enter();

        match self.score(payload) {
            Ok(probability) => {
                info!(probability, "prediction succeeded");
                Prediction::Success { probability }
            }
            Err(e) => {
                warn!("prediction failed: {e}");
                Prediction::Failure {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Status summary for the model status endpoint.
    pub fn status(&self) -> Value {
        serde_json::json!({
            "model_id": self.model.model_id(),
            "sha256": self.model.sha256(),
            "numeric_columns": self.schema().numeric_columns(),
            "categorical_columns": self.schema().categorical_columns(),
            "ready": !self.schema().is_empty(),
            "current_year": self.deriver.current_year(),
            "enroll_reference": self.deriver.enroll_reference().to_string(),
        })
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_deriver::default_enroll_reference;
    use crate::model::{ColumnGroup, GroupColumns};
    use serde_json::json;

    /// Returns a fixed probability and records the width it was given.
    struct Fixed {
        groups: Vec<ColumnGroup>,
        proba: Vec<f64>,
    }

    impl ScoringModel for Fixed {
        fn model_id(&self) -> &str {
            "fixed"
        }
        fn column_groups(&self) -> Result<Vec<ColumnGroup>, ModelError> {
            Ok(self.groups.clone())
        }
        fn predict_proba(&self, row: &FeatureVector) -> Result<Vec<f64>, ModelError> {
            if row.len() != 3 {
                return Err(ModelError::DimensionMismatch {
                    expected: 3,
                    actual: row.len(),
                });
            }
            Ok(self.proba.clone())
        }
    }

    fn service(groups: Vec<ColumnGroup>, proba: Vec<f64>) -> ScoringService {
        ScoringService::new(
            LoadedModel::new(Box::new(Fixed { groups, proba })),
            FeatureDeriver::new(2025, default_enroll_reference()),
        )
    }

    fn groups() -> Vec<ColumnGroup> {
        vec![
            ColumnGroup {
                name: "num".into(),
                columns: GroupColumns::Columns(vec!["Income".into(), "TotalSpent".into()]),
            },
            ColumnGroup {
                name: "cat".into(),
                columns: GroupColumns::Columns(vec!["Education".into()]),
            },
        ]
    }

    #[test]
    fn probability_is_rounded() {
        let svc = service(groups(), vec![0.876543, 0.123456789]);
        assert_eq!(svc.predict(json!({})), Prediction::Success { probability: 0.1235 });
    }

    #[test]
    fn prepare_derives_before_completing() {
        let svc = service(groups(), vec![0.5, 0.5]);
        let row = svc.prepare(json!({"MntWines": 3, "MntFruits": "4"})).unwrap();
        assert_eq!(row.numeric_values(), [0.0, 7.0]);
        assert_eq!(row.categorical_values(), ["Unknown"]);
    }

    #[test]
    fn unrecoverable_engineered_value_completes_to_zero() {
        let mut g = groups();
        g[0].columns = GroupColumns::Columns(vec!["Income".into(), "DaysSinceEnroll".into()]);
        let svc = service(g, vec![0.5, 0.5]);

        let row = svc.prepare(json!({"DaysSinceEnroll": null, "Income": 10})).unwrap();
        assert_eq!(row.numeric_values(), [10.0, 0.0]);

        let row = svc.prepare(json!({"DaysSinceEnroll": "abc", "Dt_Customer": "31/12/2023"})).unwrap();
        assert_eq!(row.numeric_values(), [0.0, 1.0]);
    }

    #[test]
    fn empty_schema_is_an_error_not_a_crash() {
        let svc = service(vec![], vec![0.5, 0.5]);
        match svc.predict(json!({"Income": 1})) {
            Prediction::Failure { error } => assert!(error.contains("schema unavailable")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let svc = service(groups(), vec![0.5, 0.5]);
        assert!(!svc.predict(json!([1, 2])).is_success());
    }

    #[test]
    fn model_errors_become_failures() {
        let mut g = groups();
        g.pop();
        let svc = service(g, vec![0.5, 0.5]);
        match svc.predict(json!({})) {
            Prediction::Failure { error } => assert!(error.contains("dimension mismatch")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn short_probability_vector_is_reported() {
        let svc = service(groups(), vec![0.5]);
        assert!(!svc.predict(json!({})).is_success());
    }

    #[test]
    fn nan_probability_is_a_failure() {
        let svc = service(groups(), vec![f64::NAN, f64::NAN]);
        match svc.predict(json!({})) {
            Prediction::Failure { error } => assert!(error.contains("non-finite")),
            other => panic!("expected failure, got {other:?}"),
        }

        let svc = service(groups(), vec![0.0, f64::INFINITY]);
        assert!(matches!(svc.score(json!({})), Err(ScoringError::Model { .. })));
    }
}
