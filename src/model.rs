//! Contract between the reconciliation layer and a trained model artifact.

use crate::feature_vector::FeatureVector;
use serde::Deserialize;
use thiserror::Error;

/// Failures raised by a model artifact.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("pipeline has no '{0}' step")]
    MissingStep(String),

    #[error("column '{0}' expected by the model is not in the feature table")]
    MissingColumn(String),

    #[error("dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("transformer '{name}' is malformed: {message}")]
    MalformedTransformer { name: String, message: String },

    #[error("model produced a non-finite score")]
    NonFinite,
}

/// Source columns of a fitted column-transform group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Option<RawColumns>")]
pub enum GroupColumns {
    /// The group discards its columns.
    #[default]
    Drop,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawColumns {
    List(Vec<String>),
    Single(String),
}

impl From<Option<RawColumns>> for GroupColumns {
    fn from(raw: Option<RawColumns>) -> Self {
        match raw {
            None => GroupColumns::Drop,
            Some(RawColumns::Single(s)) if s == "drop" => GroupColumns::Drop,
            Some(RawColumns::Single(s)) => GroupColumns::Columns(vec![s]),
            Some(RawColumns::List(cols)) => GroupColumns::Columns(cols),
        }
    }
}

impl GroupColumns {
    /// Columns contributed by this group; empty for dropped groups.
    pub fn as_slice(&self) -> &[String] {
        match self {
            GroupColumns::Drop => &[],
            GroupColumns::Columns(cols) => cols,
        }
    }
}

/// One fitted column-transform group, e.g. `("num", [Income, Age, ...])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    pub name: String,
    pub columns: GroupColumns,
}

/// Capabilities a trained pipeline must expose to be served.
pub trait ScoringModel: Send + Sync {
    /// Identifier reported in logs and status output.
    fn model_id(&self) -> &str;

    /// Fitted preprocessing groups, in fitted order.
    fn column_groups(&self) -> Result<Vec<ColumnGroup>, ModelError>;

    /// Class probabilities for one reconciled row. Index 1 is "accept".
    fn predict_proba(&self, row: &FeatureVector) -> Result<Vec<f64>, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default)]
        columns: GroupColumns,
    }

    fn parse(v: serde_json::Value) -> GroupColumns {
        serde_json::from_value::<Holder>(v).unwrap().columns
    }

    #[test]
    fn drop_sentinel_forms() {
        assert_eq!(parse(json!({"columns": "drop"})), GroupColumns::Drop);
        assert_eq!(parse(json!({"columns": null})), GroupColumns::Drop);
        assert_eq!(parse(json!({})), GroupColumns::Drop);
    }

    #[test]
    fn column_lists_and_single_names() {
        assert_eq!(
            parse(json!({"columns": ["Income", "Age"]})),
            GroupColumns::Columns(vec!["Income".into(), "Age".into()])
        );
        assert_eq!(
            parse(json!({"columns": "Income"})),
            GroupColumns::Columns(vec!["Income".into()])
        );
    }
}
