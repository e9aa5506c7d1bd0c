use std::collections::HashSet;

use listing_structs::ColumnKind;
use serde::{Deserialize, Serialize};

use crate::{Metrics, SchemaError};

/// Persisted contract between a training run and every later prediction.
///
/// `feature_columns` fixes the exact column order the estimator was fitted
/// on. Every feature column is either categorical or numeric, never both,
/// and the target is never a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered feature columns.
    pub feature_columns: Vec<String>,
    /// Text / category columns, in feature order.
    pub categorical_columns: Vec<String>,
    /// Numeric columns, in feature order.
    pub numeric_columns: Vec<String>,
    /// Name of the target column the estimator predicts.
    pub target_column: String,
    /// Whether the estimator was fitted on `ln(1 + target)`.
    pub use_log_target: bool,
    /// Held-out test metrics, in target units. Informational only.
    #[serde(default)]
    pub metrics: Option<Metrics>,
    /// Epoch whose weights were kept by early stopping.
    #[serde(default)]
    pub best_iteration: Option<usize>,
}

impl Schema {
    /// Returns the declared kind of a feature column.
    #[must_use]
    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        if self.categorical_columns.iter().any(|c| c == column) {
            Some(ColumnKind::Categorical)
        } else if self.numeric_columns.iter().any(|c| c == column) {
            Some(ColumnKind::Numeric)
        } else {
            None
        }
    }

    /// Positions of the categorical columns within `feature_columns`.
    #[must_use]
    pub fn categorical_indices(&self) -> Vec<usize> {
        self.feature_columns
            .iter()
            .enumerate()
            .filter(|(_, c)| self.categorical_columns.contains(c))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Checks the partition invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InconsistentSchema`] if a column is duplicated,
    /// typed twice, untyped, typed but not a feature, or is the target.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let fail = |msg: String| Err(SchemaError::InconsistentSchema(msg));

        let mut seen = HashSet::new();
        for column in &self.feature_columns {
            if !seen.insert(column.as_str()) {
                return fail(format!("feature column '{column}' listed twice"));
            }
            if *column == self.target_column {
                return fail(format!("target '{column}' is listed as a feature"));
            }
            let categorical = self.categorical_columns.contains(column);
            let numeric = self.numeric_columns.contains(column);
            if categorical && numeric {
                return fail(format!("column '{column}' is both categorical and numeric"));
            }
            if !categorical && !numeric {
                return fail(format!("column '{column}' has no type"));
            }
        }

        let typed = self.categorical_columns.len() + self.numeric_columns.len();
        if typed != self.feature_columns.len() {
            return fail(format!(
                "{typed} typed columns for {} features",
                self.feature_columns.len()
            ));
        }

        Ok(())
    }

    /// Inverts the target transform on a raw estimator score.
    #[must_use]
    pub fn invert_target(&self, score: f64) -> f64 {
        if self.use_log_target {
            score.exp_m1()
        } else {
            score
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema {
            feature_columns: vec!["Brand".into(), "Mileage_km".into(), "Fuel_type".into()],
            categorical_columns: vec!["Brand".into(), "Fuel_type".into()],
            numeric_columns: vec!["Mileage_km".into()],
            target_column: "Price".into(),
            use_log_target: true,
            metrics: None,
            best_iteration: None,
        }
    }

    #[test]
    fn test_kind_lookup() {
        let schema = schema();
        assert_eq!(schema.kind_of("Brand"), Some(ColumnKind::Categorical));
        assert_eq!(schema.kind_of("Mileage_km"), Some(ColumnKind::Numeric));
        assert_eq!(schema.kind_of("Price"), None);
        assert_eq!(schema.categorical_indices(), [0, 2]);
    }

    #[test]
    fn test_validate_accepts_partition() {
        assert_eq!(schema().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_overlap_and_gaps() {
        let mut overlap = schema();
        overlap.numeric_columns.push("Brand".into());
        assert!(overlap.validate().is_err());

        let mut untyped = schema();
        untyped.feature_columns.push("Colour".into());
        assert!(untyped.validate().is_err());

        let mut target = schema();
        target.feature_columns.push("Price".into());
        target.numeric_columns.push("Price".into());
        assert!(target.validate().is_err());

        let mut stray = schema();
        stray.numeric_columns.push("Power_HP".into());
        assert!(stray.validate().is_err());
    }

    #[test]
    fn test_invert_target() {
        let mut schema = schema();
        assert!((schema.invert_target(11.0) - 59_873.141_715_197_6).abs() < 1e-6);

        schema.use_log_target = false;
        assert!((schema.invert_target(11.0) - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let schema = schema();
        let json = serde_json::to_string(&schema).unwrap();
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(back.feature_columns, schema.feature_columns);
        assert_eq!(back, schema);
    }
}
