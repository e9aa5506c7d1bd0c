//! Scoring one listing against a loaded estimator and schema.

use std::sync::Arc;

use anyhow::Context;
use feature_schema::{FeatureFrame, FeatureRow, Schema, UserInput, build_row};
use ml_model::{PriceRegressor, Regressor};
use serde::Serialize;
use tracing::debug;

use crate::{ArtifactBundle, ArtifactError};

/// A price estimate and the exact row that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Estimate in the target's original units.
    pub price: f64,
    /// Schema-ordered features handed to the estimator.
    pub features: FeatureRow,
}

/// Checks that an estimator was fitted on exactly the schema's columns.
///
/// # Errors
///
/// Returns [`ArtifactError::SchemaMismatch`] if the feature columns differ in
/// length or order, or the categorical columns differ.
pub fn check_coupling<R: Regressor + ?Sized>(
    estimator: &R,
    schema: &Schema,
) -> Result<(), ArtifactError> {
    if estimator.feature_columns() != schema.feature_columns.as_slice() {
        return Err(ArtifactError::SchemaMismatch {
            expected: estimator.feature_columns().to_vec(),
            found: schema.feature_columns.clone(),
        });
    }

    if estimator.categorical_features() != schema.categorical_indices().as_slice() {
        let names = |indices: &[usize]| {
            indices
                .iter()
                .filter_map(|&i| schema.feature_columns.get(i).cloned())
                .collect()
        };
        return Err(ArtifactError::SchemaMismatch {
            expected: names(estimator.categorical_features()),
            found: schema.categorical_columns.clone(),
        });
    }

    Ok(())
}

/// Predicts a price for one partial listing.
///
/// Builds the feature row, scores it and undoes the log transform when the
/// schema says the estimator was fitted on `ln(1 + price)`.
///
/// # Errors
///
/// Returns an error if the estimator rejects the row or returns no score.
pub fn predict<R: Regressor + ?Sized>(
    user_input: &UserInput,
    estimator: &R,
    schema: &Schema,
) -> anyhow::Result<f64> {
    predict_row(user_input, estimator, schema).map(|p| p.price)
}

fn predict_row<R: Regressor + ?Sized>(
    user_input: &UserInput,
    estimator: &R,
    schema: &Schema,
) -> anyhow::Result<Prediction> {
    let row = build_row(user_input, schema);
    let frame = FeatureFrame::from(row.clone());

    let score = estimator
        .predict(&frame)?
        .first()
        .copied()
        .context("Estimator returned no score")?;
    let price = schema.invert_target(score);
    debug!(score, price, "Scored listing");

    Ok(Prediction {
        price,
        features: row,
    })
}

/// Shared, read-only prediction entry point.
///
/// Cloning is cheap and every clone scores against the same estimator and
/// schema, so one service can serve any number of concurrent requests.
#[derive(Debug)]
pub struct InferenceService<R: Regressor = PriceRegressor> {
    estimator: Arc<R>,
    schema: Arc<Schema>,
}

impl<R: Regressor> Clone for InferenceService<R> {
    fn clone(&self) -> Self {
        Self {
            estimator: Arc::clone(&self.estimator),
            schema: Arc::clone(&self.schema),
        }
    }
}

impl<R: Regressor> InferenceService<R> {
    /// Creates a service after checking that estimator and schema belong together.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::SchemaMismatch`] if they do not.
    pub fn new(estimator: Arc<R>, schema: Arc<Schema>) -> Result<Self, ArtifactError> {
        check_coupling(estimator.as_ref(), &schema)?;
        Ok(Self { estimator, schema })
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn estimator(&self) -> &R {
        &self.estimator
    }

    /// Predicts a price and returns it with the row that was scored.
    ///
    /// # Errors
    ///
    /// See [`predict`].
    pub fn predict(&self, user_input: &UserInput) -> anyhow::Result<Prediction> {
        predict_row(user_input, self.estimator.as_ref(), &self.schema)
    }
}

impl InferenceService<PriceRegressor> {
    /// Creates a service from a loaded artifact bundle.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::SchemaMismatch`] if the bundle is inconsistent.
    pub fn from_bundle(bundle: ArtifactBundle) -> Result<Self, ArtifactError> {
        Self::new(Arc::new(bundle.regressor), Arc::new(bundle.schema))
    }
}
