//! Reconciles an enriched record against the model's feature schema.

use crate::feature_schema::FeatureSchema;
use crate::feature_vector::FeatureVector;
use crate::record::{to_category, to_numeric, RawRecord, UNKNOWN_CATEGORY};
use serde_json::Value;
use std::sync::Arc;

/// Flag and count fields coerced to numbers whenever present.
pub const FLAG_FIELDS: [&str; 11] = [
    "AcceptedCmp1",
    "AcceptedCmp2",
    "AcceptedCmp3",
    "AcceptedCmp4",
    "AcceptedCmp5",
    "Complain",
    "Kidhome",
    "Teenhome",
    "Z_CostContact",
    "Z_Revenue",
    "NumDealsPurchases",
];

/// Coerce present flag fields to numbers; unparseable ones become null.
/// Absent fields stay absent. Idempotent.
pub fn normalize_flags(record: &mut RawRecord) {
    for field in FLAG_FIELDS {
        if let Some(value) = record.get_mut(field) {
            *value = to_numeric(value)
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null);
        }
    }
}

/// Builds schema-complete feature vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputCompleter;

impl InputCompleter {
    /// Produce the reconciled row for `record`.
    ///
    /// Missing numeric columns become 0 and missing categorical columns
    /// become `"Unknown"`; columns outside the schema are dropped and the
    /// rest are laid out in schema order. This cannot fail.
    pub fn complete(&self, mut record: RawRecord, schema: &Arc<FeatureSchema>) -> FeatureVector {
        normalize_flags(&mut record);

        let numeric = schema
            .numeric_columns()
            .iter()
            .map(|col| record.get(col).and_then(to_numeric).unwrap_or(0.0))
            .collect();

        let categorical = schema
            .categorical_columns()
            .iter()
            .map(|col| {
                record
                    .get(col)
                    .and_then(to_category)
                    .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
            })
            .collect();

        FeatureVector::new(Arc::clone(schema), numeric, categorical)
    }
}
