//! The frozen, backend-free estimator used at prediction time.

use anyhow::{bail, ensure};
use listing_structs::FeatureFrame;
use serde::{Deserialize, Serialize};

use crate::{FeatureEncoder, Regressor};

/// One fully connected layer, weights stored row-major as `[d_in, d_out]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
    pub d_in: usize,
    pub d_out: usize,
    pub relu: bool,
}

impl DenseLayer {
    fn forward(&self, input: &[f64]) -> Vec<f64> {
        (0..self.d_out)
            .map(|j| {
                let z = input
                    .iter()
                    .enumerate()
                    .fold(f64::from(self.bias[j]), |acc, (i, x)| {
                        x.mul_add(f64::from(self.weights[i * self.d_out + j]), acc)
                    });
                if self.relu { z.max(0.0) } else { z }
            })
            .collect()
    }

    fn check(&self) -> anyhow::Result<()> {
        ensure!(
            self.weights.len() == self.d_in * self.d_out && self.bias.len() == self.d_out,
            "Layer {}x{} has {} weights and {} biases",
            self.d_in,
            self.d_out,
            self.weights.len(),
            self.bias.len()
        );
        Ok(())
    }
}

/// Runs the layers over one encoded row and returns the single output.
pub(crate) fn forward_layers(layers: &[DenseLayer], input: Vec<f64>) -> f64 {
    layers
        .iter()
        .fold(input, |x, layer| layer.forward(&x))
        .first()
        .copied()
        .unwrap_or(0.0)
}

/// A trained price estimator.
///
/// Holds the encoder fitted on the training split and the weights of the
/// best epoch. Immutable after construction, so it can be shared across
/// threads and scored concurrently without locking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRegressor {
    feature_columns: Vec<String>,
    categorical_features: Vec<usize>,
    encoder: FeatureEncoder,
    layers: Vec<DenseLayer>,
}

impl PriceRegressor {
    /// Assembles a regressor, checking that the pieces fit together.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer shapes do not chain from the encoder's
    /// inputs to a single output.
    pub fn new(
        feature_columns: Vec<String>,
        categorical_features: Vec<usize>,
        encoder: FeatureEncoder,
        layers: Vec<DenseLayer>,
    ) -> anyhow::Result<Self> {
        let regressor = Self {
            feature_columns,
            categorical_features,
            encoder,
            layers,
        };
        regressor.check()?;
        Ok(regressor)
    }

    /// Validates internal consistency, e.g. after deserialising.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found.
    pub fn check(&self) -> anyhow::Result<()> {
        ensure!(
            self.encoder.n_features() == self.feature_columns.len(),
            "Encoder has {} inputs for {} columns",
            self.encoder.n_features(),
            self.feature_columns.len()
        );
        let mut width = self.feature_columns.len();
        for layer in &self.layers {
            layer.check()?;
            ensure!(
                layer.d_in == width,
                "Layer expects {} inputs but receives {width}",
                layer.d_in
            );
            width = layer.d_out;
        }
        ensure!(
            !self.layers.is_empty() && width == 1,
            "Network must end in a single output"
        );
        Ok(())
    }

    /// Scores one row of already-coerced features.
    fn score_row(&self, row: &[listing_structs::FeatureValue]) -> f64 {
        let encoded = self.encoder.encode_row(row);
        self.encoder.unscale_target(forward_layers(&self.layers, encoded))
    }

    /// Total absolute first-layer weight attached to each input column.
    ///
    /// A cheap sensitivity ranking: inputs are standardised, so columns the
    /// network leans on carry more weight mass.
    #[must_use]
    pub fn input_weight_mass(&self) -> Vec<(String, f64)> {
        let Some(first) = self.layers.first() else {
            return Vec::new();
        };
        self.feature_columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let row = &first.weights[i * first.d_out..(i + 1) * first.d_out];
                let mass = row.iter().map(|w| f64::from(w.abs())).sum();
                (column.clone(), mass)
            })
            .collect()
    }
}

impl Regressor for PriceRegressor {
    fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    fn categorical_features(&self) -> &[usize] {
        &self.categorical_features
    }

    fn predict(&self, frame: &FeatureFrame) -> anyhow::Result<Vec<f64>> {
        if frame.columns() != self.feature_columns.as_slice() {
            bail!(
                "Feature columns {:?} do not match the fitted columns {:?}",
                frame.columns(),
                self.feature_columns
            );
        }
        Ok(frame.rows().iter().map(|row| self.score_row(row)).collect())
    }
}
