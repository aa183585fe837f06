//! Input contract discovered from a loaded model.

use crate::model::{GroupColumns, ScoringModel};
use serde::Serialize;
use tracing::{debug, warn};

/// Group name carrying the numeric input columns.
pub const NUMERIC_GROUP: &str = "num";
/// Group name carrying the categorical input columns.
pub const CATEGORICAL_GROUP: &str = "cat";

/// Ordered numeric and categorical columns the model was fitted on.
///
/// The concatenation `numeric_columns ++ categorical_columns` is the exact
/// column order the model's preprocessing stage expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureSchema {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(numeric_columns: Vec<String>, categorical_columns: Vec<String>) -> Self {
        Self {
            numeric_columns,
            categorical_columns,
        }
    }

    /// Read the fitted column groups of `model`.
    ///
    /// Never fails: an artifact whose groups cannot be enumerated yields an
    /// empty schema, which the scoring service reports per request.
    pub fn introspect(model: &dyn ScoringModel) -> Self {
        let groups = match model.column_groups() {
            Ok(groups) => groups,
            Err(e) => {
                warn!(
                    model_id = model.model_id(),
                    "schema introspection failed, serving with empty schema: {e}"
                );
                return Self::default();
            }
        };

        let mut schema = Self::default();
        for group in groups {
            let columns = match group.columns {
                GroupColumns::Columns(cols) if !cols.is_empty() => cols,
                _ => continue,
            };
            match group.name.as_str() {
                NUMERIC_GROUP => schema.numeric_columns.extend(columns),
                CATEGORICAL_GROUP => schema.categorical_columns.extend(columns),
                other => debug!(group = other, "ignoring unrecognised column group"),
            }
        }
        schema
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    /// All columns in model order: numeric first, then categorical.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.numeric_columns
            .iter()
            .chain(self.categorical_columns.iter())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.numeric_columns.len() + self.categorical_columns.len()
    }

    /// True when no reconciliation is possible.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_vector::FeatureVector;
    use crate::model::{ColumnGroup, ModelError};

    struct Groups(Result<Vec<ColumnGroup>, ModelError>);

    impl ScoringModel for Groups {
        fn model_id(&self) -> &str {
            "groups"
        }
        fn column_groups(&self) -> Result<Vec<ColumnGroup>, ModelError> {
            self.0.clone()
        }
        fn predict_proba(&self, _row: &FeatureVector) -> Result<Vec<f64>, ModelError> {
            Ok(vec![0.5, 0.5])
        }
    }

    fn group(name: &str, cols: &[&str]) -> ColumnGroup {
        ColumnGroup {
            name: name.to_string(),
            columns: GroupColumns::Columns(cols.iter().map(|c| c.to_string()).collect()),
        }
    }

    #[test]
    fn collects_num_and_cat_in_fitted_order() {
        let model = Groups(Ok(vec![
            group("cat", &["Education", "Marital_Status"]),
            group("num", &["Income", "Age"]),
            ColumnGroup {
                name: "remainder".into(),
                columns: GroupColumns::Drop,
            },
            group("text", &["Notes"]),
        ]));
        let schema = FeatureSchema::introspect(&model);
        assert_eq!(schema.numeric_columns(), ["Income", "Age"]);
        assert_eq!(schema.categorical_columns(), ["Education", "Marital_Status"]);
        assert_eq!(
            schema.columns().collect::<Vec<_>>(),
            vec!["Income", "Age", "Education", "Marital_Status"]
        );
    }

    #[test]
    fn dropped_and_empty_groups_are_skipped() {
        let model = Groups(Ok(vec![
            ColumnGroup {
                name: "num".into(),
                columns: GroupColumns::Drop,
            },
            group("cat", &[]),
        ]));
        assert!(FeatureSchema::introspect(&model).is_empty());
    }

    #[test]
    fn zero_groups_yield_empty_schema() {
        let schema = FeatureSchema::introspect(&Groups(Ok(vec![])));
        assert!(schema.numeric_columns().is_empty());
        assert!(schema.categorical_columns().is_empty());
    }

    #[test]
    fn introspection_failure_is_fail_open() {
        let model = Groups(Err(ModelError::MissingStep("prep".into())));
        assert_eq!(FeatureSchema::introspect(&model), FeatureSchema::default());
    }
}
