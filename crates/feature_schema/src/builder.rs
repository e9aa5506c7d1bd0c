//! Deriving the schema and training matrix from a labelled dataset.

use listing_structs::{ColumnKind, Dataset, FeatureFrame};
use tracing::{debug, info};

use crate::coerce::{coerce_cell, field_value_at};
use crate::{Schema, SchemaError};

/// Row identifier column that is never a model input.
pub const IDENTIFIER_COLUMN: &str = "Index";

/// Coerced features, target values and the schema describing them.
#[derive(Debug, Clone)]
pub struct TrainingMatrix {
    /// One row per labelled listing, columns in schema order.
    pub features: FeatureFrame,
    /// Target values in original units, aligned with `features`.
    pub target: Vec<f64>,
    pub schema: Schema,
}

/// Derives a [`Schema`] from a dataset.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    target_column: String,
    use_log_target: bool,
    identifier_columns: Vec<String>,
}

impl SchemaBuilder {
    /// Creates a builder for the given target column.
    pub fn new<S: Into<String>>(target_column: S) -> Self {
        Self {
            target_column: target_column.into(),
            use_log_target: false,
            identifier_columns: vec![IDENTIFIER_COLUMN.to_string()],
        }
    }

    /// Records whether the estimator will be fitted on `ln(1 + target)`.
    #[must_use]
    pub fn with_log_target(mut self, use_log_target: bool) -> Self {
        self.use_log_target = use_log_target;
        self
    }

    /// Replaces the identifier columns excluded from the features.
    #[must_use]
    pub fn with_identifier_columns(mut self, columns: Vec<String>) -> Self {
        self.identifier_columns = columns;
        self
    }

    #[must_use]
    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Keeps only the rows that have a numeric target value.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingColumn`] if the target column is absent
    /// and [`SchemaError::EmptyDataset`] if no row has a target.
    pub fn labelled_rows(&self, dataset: &Dataset) -> Result<Dataset, SchemaError> {
        let target = dataset
            .column(&self.target_column)
            .ok_or_else(|| SchemaError::MissingColumn {
                column: self.target_column.clone(),
                available: dataset.column_names().map(str::to_string).collect(),
            })?;

        let labelled =
            dataset.filter_rows(|row| target.data.number(row).is_some_and(f64::is_finite));

        let dropped = dataset.n_rows() - labelled.n_rows();
        if dropped > 0 {
            info!(dropped, target = %self.target_column, "Dropped rows without target");
        }
        if labelled.is_empty() {
            return Err(SchemaError::EmptyDataset {
                target: self.target_column.clone(),
            });
        }

        Ok(labelled)
    }

    /// Builds the schema and coerced training matrix.
    ///
    /// Column types come from the dataset's declared column kinds. Categorical
    /// cells become strings with absences mapped to the sentinel; numeric cells
    /// become finite numbers with `0` for anything unusable.
    ///
    /// # Errors
    ///
    /// See [`SchemaBuilder::labelled_rows`] and [`SchemaBuilder::build_labelled`].
    pub fn build(&self, dataset: &Dataset) -> Result<TrainingMatrix, SchemaError> {
        self.build_labelled(&self.labelled_rows(dataset)?)
    }

    /// Builds the schema and training matrix from the output of
    /// [`SchemaBuilder::labelled_rows`].
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingColumn`] if the target column is absent,
    /// [`SchemaError::EmptyDataset`] if there are no rows,
    /// [`SchemaError::InconsistentSchema`] if a row has no finite target and
    /// [`SchemaError::NoFeatures`] if no column is left to learn from.
    pub fn build_labelled(&self, labelled: &Dataset) -> Result<TrainingMatrix, SchemaError> {
        let target_column =
            labelled
                .column(&self.target_column)
                .ok_or_else(|| SchemaError::MissingColumn {
                    column: self.target_column.clone(),
                    available: labelled.column_names().map(str::to_string).collect(),
                })?;
        if labelled.is_empty() {
            return Err(SchemaError::EmptyDataset {
                target: self.target_column.clone(),
            });
        }

        let target = (0..labelled.n_rows())
            .map(|row| {
                target_column
                    .data
                    .number(row)
                    .filter(|y| y.is_finite())
                    .ok_or_else(|| {
                        SchemaError::InconsistentSchema(format!(
                            "row {row} has no value for target '{}'",
                            self.target_column
                        ))
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let features: Vec<_> = labelled
            .columns()
            .iter()
            .filter(|c| c.name != self.target_column)
            .filter(|c| !self.identifier_columns.contains(&c.name))
            .collect();
        if features.is_empty() {
            return Err(SchemaError::NoFeatures {
                target: self.target_column.clone(),
            });
        }

        let names_of = |kind: ColumnKind| -> Vec<String> {
            features
                .iter()
                .filter(|c| c.kind() == kind)
                .map(|c| c.name.clone())
                .collect()
        };

        let schema = Schema {
            feature_columns: features.iter().map(|c| c.name.clone()).collect(),
            categorical_columns: names_of(ColumnKind::Categorical),
            numeric_columns: names_of(ColumnKind::Numeric),
            target_column: self.target_column.clone(),
            use_log_target: self.use_log_target,
            metrics: None,
            best_iteration: None,
        };
        schema.validate()?;

        let mut frame = FeatureFrame::new(schema.feature_columns.clone());
        for row in 0..labelled.n_rows() {
            frame.push(
                features
                    .iter()
                    .map(|c| coerce_cell(c.kind(), &field_value_at(&c.data, row)))
                    .collect(),
            );
        }

        debug!(
            rows = frame.len(),
            features = schema.feature_columns.len(),
            categorical = schema.categorical_columns.len(),
            numeric = schema.numeric_columns.len(),
            "Built training matrix"
        );

        Ok(TrainingMatrix {
            features: frame,
            target,
            schema,
        })
    }
}
