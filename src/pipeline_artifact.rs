//! Fitted preprocessing + logistic classifier, serialized as JSON.
//!
//! The artifact mirrors a column-transformer pipeline: a `prep` step made of
//! named transformer groups (`num`, `cat`, ...), each bound to source
//! columns, followed by a logistic regression over the concatenated output.

use crate::errors::{ScoringError, ScoringResult};
use crate::feature_vector::{Cell, FeatureVector};
use crate::model::{ColumnGroup, GroupColumns, ModelError, ScoringModel};
use serde::Deserialize;

/// Fitted transformer applied to one group of columns.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transform {
    StandardScaler { mean: Vec<f64>, scale: Vec<f64> },
    /// Unknown categories encode as all zeros.
    OneHot { categories: Vec<Vec<String>> },
    Passthrough,
    Drop,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformerSpec {
    pub name: String,
    #[serde(default)]
    pub columns: GroupColumns,
    #[serde(flatten)]
    pub transform: Transform,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnTransformer {
    pub transformers: Vec<TransformerSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticClassifier {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

/// A complete fitted pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineArtifact {
    pub model_id: String,
    #[serde(default)]
    pub prep: Option<ColumnTransformer>,
    pub classifier: LogisticClassifier,
}

impl PipelineArtifact {
    /// Parse an artifact from its JSON bytes.
    pub fn from_slice(path: &str, bytes: &[u8]) -> ScoringResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| ScoringError::model_load(path, e))
    }

    fn prep(&self) -> Result<&ColumnTransformer, ModelError> {
        self.prep
            .as_ref()
            .ok_or_else(|| ModelError::MissingStep("prep".to_string()))
    }

    /// Apply the fitted preprocessing to a reconciled row.
    fn transform(&self, row: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        let mut out = Vec::with_capacity(self.classifier.coef.len());
        for spec in &self.prep()?.transformers {
            let columns = spec.columns.as_slice();
            match &spec.transform {
                Transform::Drop => {}
                Transform::Passthrough => {
                    for col in columns {
                        out.push(numeric_cell(spec, row, col)?);
                    }
                }
                Transform::StandardScaler { mean, scale } => {
                    check_width(spec, "mean", mean.len())?;
                    check_width(spec, "scale", scale.len())?;
                    for (i, col) in columns.iter().enumerate() {
                        let x = numeric_cell(spec, row, col)?;
                        let s = if scale[i] == 0.0 { 1.0 } else { scale[i] };
                        out.push((x - mean[i]) / s);
                    }
                }
                Transform::OneHot { categories } => {
                    check_width(spec, "categories", categories.len())?;
                    for (i, col) in columns.iter().enumerate() {
                        let value = match cell(row, col)? {
                            Cell::Categorical(s) => s.to_string(),
                            Cell::Numeric(v) => v.to_string(),
                        };
                        out.extend(categories[i].iter().map(|c| if *c == value { 1.0 } else { 0.0 }));
                    }
                }
            }
        }
        Ok(out)
    }
}

fn check_width(spec: &TransformerSpec, param: &str, len: usize) -> Result<(), ModelError> {
    let expected = spec.columns.as_slice().len();
    if len == expected {
        return Ok(());
    }
    Err(ModelError::MalformedTransformer {
        name: spec.name.clone(),
        message: format!("{param} has {len} entries for {expected} columns"),
    })
}

fn cell<'a>(row: &'a FeatureVector, column: &str) -> Result<Cell<'a>, ModelError> {
    row.get(column)
        .ok_or_else(|| ModelError::MissingColumn(column.to_string()))
}

fn numeric_cell(spec: &TransformerSpec, row: &FeatureVector, column: &str) -> Result<f64, ModelError> {
    match cell(row, column)? {
        Cell::Numeric(v) => Ok(v),
        Cell::Categorical(s) => s.parse().map_err(|_| ModelError::MalformedTransformer {
            name: spec.name.clone(),
            message: format!("column '{column}' is not numeric"),
        }),
    }
}

impl ScoringModel for PipelineArtifact {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn column_groups(&self) -> Result<Vec<ColumnGroup>, ModelError> {
        Ok(self
            .prep()?
            .transformers
            .iter()
            .map(|spec| ColumnGroup {
                name: spec.name.clone(),
                columns: match spec.transform {
                    Transform::Drop => GroupColumns::Drop,
                    _ => spec.columns.clone(),
                },
            })
            .collect())
    }

    /// Logistic scoring: `p = 1 / (1 + e^-(b + w·x))`, returned as `[1 - p, p]`.
    fn predict_proba(&self, row: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        let features = self.transform(row)?;
        if features.len() != self.classifier.coef.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.classifier.coef.len(),
                actual: features.len(),
            });
        }

        let linear = self.classifier.intercept
            + features
                .iter()
                .zip(self.classifier.coef.iter())
                .map(|(x, w)| x * w)
                .sum::<f64>();
        let p = 1.0 / (1.0 + (-linear).exp());
        if !p.is_finite() {
            return Err(ModelError::NonFinite);
        }
        Ok(vec![1.0 - p, p])
    }
}
