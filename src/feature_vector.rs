//! The reconciled row handed across the model boundary.

use crate::feature_schema::FeatureSchema;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// A single cell of a reconciled row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Numeric(f64),
    Categorical(&'a str),
}

/// Fully typed, fully ordered, gap-free row.
///
/// Cells are stored per kind, aligned with the schema's column lists, so a
/// numeric column can never hold text and no cell can be null.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: Arc<FeatureSchema>,
    numeric: Vec<f64>,
    categorical: Vec<String>,
}

impl FeatureVector {
    /// Pair values with `schema`. Lengths must match the schema's lists;
    /// only the input completer builds vectors.
    pub(crate) fn new(schema: Arc<FeatureSchema>, numeric: Vec<f64>, categorical: Vec<String>) -> Self {
        debug_assert_eq!(numeric.len(), schema.numeric_columns().len());
        debug_assert_eq!(categorical.len(), schema.categorical_columns().len());
        Self {
            schema,
            numeric,
            categorical,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn numeric_values(&self) -> &[f64] {
        &self.numeric
    }

    pub fn categorical_values(&self) -> &[String] {
        &self.categorical
    }

    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a cell by column name.
    pub fn get(&self, column: &str) -> Option<Cell<'_>> {
        if let Some(i) = self.schema.numeric_columns().iter().position(|c| c == column) {
            return Some(Cell::Numeric(self.numeric[i]));
        }
        self.schema
            .categorical_columns()
            .iter()
            .position(|c| c == column)
            .map(|i| Cell::Categorical(&self.categorical[i]))
    }

    /// `(column, cell)` pairs in model order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Cell<'_>)> {
        let numeric = self
            .schema
            .numeric_columns()
            .iter()
            .zip(self.numeric.iter())
            .map(|(c, v)| (c.as_str(), Cell::Numeric(*v)));
        let categorical = self
            .schema
            .categorical_columns()
            .iter()
            .zip(self.categorical.iter())
            .map(|(c, v)| (c.as_str(), Cell::Categorical(v.as_str())));
        numeric.chain(categorical)
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, cell) in self.iter() {
            match cell {
                Cell::Numeric(v) => map.serialize_entry(column, &v)?,
                Cell::Categorical(s) => map.serialize_entry(column, s)?,
            }
        }
        map.end()
    }
}
