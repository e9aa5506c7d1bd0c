//! ML model crate for car price prediction.
//!
//! This crate uses the Burn deep learning framework to define and train a
//! small feed-forward network on tabular listing features. A trained network
//! is frozen into a [`PriceRegressor`], which holds plain weight matrices and
//! scores feature frames without any tensor backend.

pub mod dataset;
pub mod encoder;
pub mod regressor;
pub mod split;
pub mod training;

use anyhow::anyhow;
use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;
use listing_structs::FeatureFrame;

pub use encoder::FeatureEncoder;
pub use regressor::{DenseLayer, PriceRegressor};
pub use split::{SplitIndices, shuffle_indices, split_indices};
pub use training::{TrainedModel, TrainingOutput, train};

/// Configuration for the price model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Number of hidden units in the first layer.
    pub hidden_size_1: usize,
    /// Number of hidden units in the second layer.
    pub hidden_size_2: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_size_1: 64,
            hidden_size_2: 32,
        }
    }
}

impl ModelConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_hidden_sizes(mut self, first: usize, second: usize) -> Self {
        self.hidden_size_1 = first;
        self.hidden_size_2 = second;
        self
    }
}

/// Configuration for training the model.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Learning rate for the optimizer.
    pub learning_rate: f64,
    /// Maximum number of training epochs.
    pub epochs: usize,
    /// Batch size for training.
    pub batch_size: usize,
    /// Epochs without validation improvement before stopping.
    pub patience: usize,
    /// Seed for the per-epoch shuffle.
    pub seed: u64,
    /// Model architecture configuration.
    pub model: ModelConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            epochs: 500,
            batch_size: 64,
            patience: 20,
            seed: 42,
            model: ModelConfig::default(),
        }
    }
}

impl TrainingConfig {
    #[must_use]
    pub fn new(model: ModelConfig) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    #[must_use]
    pub const fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub const fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Labelled rows handed to [`train`].
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    pub features: FeatureFrame,
    /// Target values aligned with `features`.
    pub target: Vec<f64>,
}

impl TrainingData {
    #[must_use]
    pub const fn new(features: FeatureFrame, target: Vec<f64>) -> Self {
        Self { features, target }
    }

    /// Returns the rows at `indices`, in that order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(indices),
            target: indices
                .iter()
                .filter_map(|&i| self.target.get(i).copied())
                .collect(),
        }
    }

    /// Returns the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.target.len()
    }

    /// Returns true if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// Anything that scores a feature frame.
///
/// Implementors must be safe to share between threads; scoring never mutates.
pub trait Regressor: Send + Sync {
    /// Columns the regressor was fitted on, in order.
    fn feature_columns(&self) -> &[String];

    /// Positions of the categorical columns within `feature_columns`.
    fn categorical_features(&self) -> &[usize];

    /// Scores every row of `frame`, in the units the regressor was fitted on.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame's columns do not match the regressor.
    fn predict(&self, frame: &FeatureFrame) -> anyhow::Result<Vec<f64>>;
}

/// The price prediction network.
///
/// A simple feedforward neural network that takes encoded listing features
/// and outputs a standardised target score.
#[derive(Module, Debug)]
pub struct PriceNet<B: Backend> {
    linear1: Linear<B>,
    linear2: Linear<B>,
    linear_out: Linear<B>,
    activation: Relu,
}

impl<B: Backend> PriceNet<B> {
    /// Creates a new network for `n_features` inputs.
    pub fn new(device: &B::Device, n_features: usize, config: &ModelConfig) -> Self {
        let linear1 = LinearConfig::new(n_features, config.hidden_size_1).init(device);
        let linear2 = LinearConfig::new(config.hidden_size_1, config.hidden_size_2).init(device);
        let linear_out = LinearConfig::new(config.hidden_size_2, 1).init(device);
        let activation = Relu::new();

        Self {
            linear1,
            linear2,
            linear_out,
            activation,
        }
    }

    /// Forward pass through the network.
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape [`batch_size`, `n_features`]
    ///
    /// # Returns
    ///
    /// Tensor of shape [`batch_size`, 1] containing standardised scores.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear1.forward(input);
        let x = self.activation.forward(x);
        let x = self.linear2.forward(x);
        let x = self.activation.forward(x);
        self.linear_out.forward(x)
    }

    /// Number of input features.
    pub fn n_features(&self) -> usize {
        self.linear1.weight.val().dims()[0]
    }

    /// Copies the current weights out of the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if tensor data cannot be read back as `f32`.
    pub fn freeze(&self) -> anyhow::Result<Vec<DenseLayer>> {
        Ok(vec![
            freeze_linear(&self.linear1, true)?,
            freeze_linear(&self.linear2, true)?,
            freeze_linear(&self.linear_out, false)?,
        ])
    }
}

fn freeze_linear<B: Backend>(linear: &Linear<B>, relu: bool) -> anyhow::Result<DenseLayer> {
    let weight = linear.weight.val();
    let [d_in, d_out] = weight.dims();
    let weights = weight
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Failed to read layer weights: {e:?}"))?;

    let bias = match &linear.bias {
        Some(bias) => bias
            .val()
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Failed to read layer bias: {e:?}"))?,
        None => vec![0.0; d_out],
    };

    Ok(DenseLayer {
        weights,
        bias,
        d_in,
        d_out,
        relu,
    })
}

/// Creates a new model with the given configuration.
pub fn create_model<B: Backend>(
    device: &B::Device,
    n_features: usize,
    config: &ModelConfig,
) -> PriceNet<B> {
    PriceNet::new(device, n_features, config)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use burn::backend::NdArray;

    use super::*;
    use crate::regressor::forward_layers;

    type TestBackend = NdArray;

    #[test]
    fn test_model_creation() {
        let device = Default::default();
        let config = ModelConfig::default();
        let model: PriceNet<TestBackend> = create_model(&device, 5, &config);
        assert_eq!(model.n_features(), 5);

        let input = Tensor::<TestBackend, 2>::zeros([3, 5], &device);
        assert_eq!(model.forward(input).dims(), [3, 1]);
    }

    #[test]
    fn test_training_config_default() {
        let config = TrainingConfig::default();
        assert!(config.learning_rate > 0.0);
        assert!(config.epochs > 0);
        assert!(config.batch_size > 0);
        assert_eq!(config.patience, 20);

        let config = TrainingConfig::new(ModelConfig::new().with_hidden_sizes(8, 4))
            .with_epochs(3)
            .with_batch_size(16);
        assert_eq!(config.epochs, 3);
        assert_eq!(config.batch_size, 16);
        assert_eq!(config.model.hidden_size_1, 8);
    }

    #[test]
    fn test_frozen_layers_match_network() {
        let device = Default::default();
        let model: PriceNet<TestBackend> = create_model(&device, 3, &ModelConfig::new());
        let layers = model.freeze().unwrap();

        assert_eq!(layers.len(), 3);
        assert_eq!((layers[0].d_in, layers[0].d_out), (3, 64));
        assert_eq!((layers[2].d_in, layers[2].d_out), (32, 1));

        let sample = [0.5_f32, -1.25, 2.0];
        let input = Tensor::<TestBackend, 1>::from_floats(sample.as_slice(), &device).reshape([1, 3]);
        let expected: Vec<f32> = model.forward(input).into_data().to_vec().unwrap();

        let frozen = forward_layers(&layers, sample.iter().map(|&v| f64::from(v)).collect());
        assert_relative_eq!(frozen, f64::from(expected[0]), epsilon = 1e-4);
    }

    #[test]
    fn test_training_data_select() {
        let mut features = FeatureFrame::new(vec!["a".into()]);
        for v in [1.0, 2.0, 3.0] {
            features.push(vec![listing_structs::FeatureValue::Number(v)]);
        }
        let data = TrainingData::new(features, vec![10.0, 20.0, 30.0]);

        let picked = data.select(&[2, 0]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked.target, [30.0, 10.0]);
        assert_eq!(
            picked.features.row(0).unwrap(),
            [listing_structs::FeatureValue::Number(3.0)]
        );
    }
}
