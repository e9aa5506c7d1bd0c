//! Building one schema-ordered feature row from partial user input.

use listing_structs::{ColumnKind, FeatureRow, FieldValue, UserInput};

use crate::Schema;
use crate::coerce::coerce_cell;

/// Builds the feature row the estimator scores for a single request.
///
/// Walks `schema.feature_columns` in order. Missing fields get the column
/// default (the sentinel for categorical columns, `0` for numeric ones) and
/// every value goes through the same coercion as the training data. Keys
/// that are not feature columns are ignored.
///
/// The returned row always has exactly `schema.feature_columns`, in order.
#[must_use]
pub fn build_row(user_input: &UserInput, schema: &Schema) -> FeatureRow {
    let values = schema
        .feature_columns
        .iter()
        .map(|column| {
            let kind = schema.kind_of(column).unwrap_or(ColumnKind::Numeric);
            let value = user_input.get(column).unwrap_or(&FieldValue::Missing);
            coerce_cell(kind, value)
        })
        .collect();

    FeatureRow::new(schema.feature_columns.clone(), values)
}
