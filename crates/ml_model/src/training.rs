//! Training logic for the price model.

use anyhow::{anyhow, bail};
use burn::data::dataset::Dataset;
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::ElementConversion;
use burn::tensor::backend::AutodiffBackend;
use tracing::{debug, info};

use crate::dataset::{PriceBatcher, PriceDataset};
use crate::split::shuffle_indices;
use crate::{DenseLayer, FeatureEncoder, PriceNet, PriceRegressor, TrainingConfig, TrainingData};

/// Batch size used when scoring the validation split.
const VALID_BATCH_SIZE: usize = 256;

/// Output from training.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutput {
    /// Epoch (1-based) whose weights were kept.
    pub best_epoch: usize,
    /// Validation loss of the kept epoch, if validation data was used.
    pub best_valid_loss: Option<f64>,
    /// Mean training loss of the last completed epoch.
    pub final_train_loss: f64,
    /// Number of epochs completed.
    pub epochs_completed: usize,
    /// Whether training stopped before `epochs`.
    pub early_stopped: bool,
}

/// A frozen estimator and how it was obtained.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub regressor: PriceRegressor,
    pub output: TrainingOutput,
}

/// Trains a price network and freezes the best epoch.
///
/// The encoder is fitted on `train` only. Each epoch shuffles the training
/// rows, runs Adam over mini-batches with MSE loss and, when `valid` is not
/// empty, scores the validation split. The weights of the epoch with the
/// lowest validation loss are kept; training stops once `patience` epochs
/// pass without improvement. Without validation data the last epoch wins.
///
/// # Errors
///
/// Returns an error if there is no training data, the splits disagree on
/// columns, or weights cannot be read back from the backend.
pub fn train<B: AutodiffBackend>(
    device: &B::Device,
    train: &TrainingData,
    valid: &TrainingData,
    categorical_features: &[usize],
    config: &TrainingConfig,
) -> anyhow::Result<TrainedModel> {
    if train.is_empty() {
        bail!("No training data provided");
    }
    if train.features.columns().is_empty() {
        bail!("No feature columns to train on");
    }
    if !valid.is_empty() && valid.features.columns() != train.features.columns() {
        bail!("Validation columns differ from training columns");
    }
    if config.batch_size == 0 {
        bail!("Batch size must be positive");
    }

    let encoder = FeatureEncoder::fit(&train.features, &train.target, categorical_features)?;
    let n_features = encoder.n_features();
    if n_features == 0 {
        bail!("Encoder produced no input features");
    }

    let dataset = PriceDataset::encode(train, &encoder);
    let valid_dataset = (!valid.is_empty()).then(|| PriceDataset::encode(valid, &encoder));
    let batcher = PriceBatcher::<B>::new(device.clone(), n_features);

    let mut model = PriceNet::<B>::new(device, n_features, &config.model);
    let mut optimizer = AdamConfig::new().init();
    let loss_fn = MseLoss::new();

    info!(
        train_rows = dataset.len(),
        valid_rows = valid_dataset.as_ref().map_or(0, PriceDataset::len),
        features = n_features,
        epochs = config.epochs,
        "Training price model"
    );

    let mut final_train_loss = 0.0;
    let mut best: Option<(usize, f64, Vec<DenseLayer>)> = None;
    let mut epochs_without_improvement = 0;
    let mut epochs_completed = 0;
    let mut early_stopped = false;

    for epoch in 0..config.epochs {
        let num_samples = dataset.len();
        let mut indices: Vec<usize> = (0..num_samples).collect();
        shuffle_indices(&mut indices, config.seed.wrapping_add(epoch as u64));

        let mut epoch_loss = 0.0;
        let mut batch_count: u32 = 0;

        for batch_indices in indices.chunks(config.batch_size) {
            let items: Vec<_> = batch_indices
                .iter()
                .filter_map(|&i| dataset.get(i))
                .collect();
            if items.is_empty() {
                continue;
            }

            let batch = batcher.batch(items);
            let predictions = model.forward(batch.inputs);
            let loss = loss_fn.forward(predictions, batch.targets, Reduction::Mean);

            epoch_loss += loss.clone().into_scalar().elem::<f64>();
            batch_count += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);
        }

        final_train_loss = if batch_count > 0 {
            epoch_loss / f64::from(batch_count)
        } else {
            0.0
        };
        epochs_completed = epoch + 1;

        let Some(valid_ds) = &valid_dataset else {
            log_progress(epochs_completed, config.epochs, final_train_loss, None);
            continue;
        };

        let valid_loss = validation_loss(&model, valid_ds, &batcher, &loss_fn);
        log_progress(epochs_completed, config.epochs, final_train_loss, Some(valid_loss));

        if best.as_ref().is_none_or(|(_, loss, _)| valid_loss < *loss) {
            best = Some((epochs_completed, valid_loss, model.freeze()?));
            epochs_without_improvement = 0;
        } else {
            epochs_without_improvement += 1;
            if epochs_without_improvement >= config.patience {
                info!(
                    epoch = epochs_completed,
                    patience = config.patience,
                    "Early stopping triggered"
                );
                early_stopped = true;
                break;
            }
        }
    }

    let (best_epoch, best_valid_loss, layers) = match best {
        Some((epoch, loss, layers)) => (epoch, Some(loss), layers),
        None => (epochs_completed, None, model.freeze()?),
    };
    info!(best_epoch, ?best_valid_loss, epochs_completed, "Training finished");

    let regressor = PriceRegressor::new(
        train.features.columns().to_vec(),
        categorical_features.to_vec(),
        encoder,
        layers,
    )
    .map_err(|e| anyhow!("Trained network is inconsistent: {e}"))?;

    Ok(TrainedModel {
        regressor,
        output: TrainingOutput {
            best_epoch,
            best_valid_loss,
            final_train_loss,
            epochs_completed,
            early_stopped,
        },
    })
}

/// Computes the mean squared error over a dataset, weighting every row equally.
fn validation_loss<B: Backend>(
    model: &PriceNet<B>,
    dataset: &PriceDataset,
    batcher: &PriceBatcher<B>,
    loss_fn: &MseLoss,
) -> f64 {
    let num_samples = dataset.len();
    if num_samples == 0 {
        return 0.0;
    }

    let mut total_loss = 0.0;
    for batch_start in (0..num_samples).step_by(VALID_BATCH_SIZE) {
        let batch_end = (batch_start + VALID_BATCH_SIZE).min(num_samples);
        let items: Vec<_> = (batch_start..batch_end)
            .filter_map(|i| dataset.get(i))
            .collect();
        let rows = items.len();
        if rows == 0 {
            continue;
        }

        let batch = batcher.batch(items);
        let predictions = model.forward(batch.inputs);
        let loss = loss_fn.forward(predictions, batch.targets, Reduction::Mean);
        total_loss += loss.into_scalar().elem::<f64>() * rows as f64;
    }

    total_loss / num_samples as f64
}

/// Logs progress every 10 epochs, at the end, and everything at debug level.
fn log_progress(epoch: usize, epochs: usize, train_loss: f64, valid_loss: Option<f64>) {
    if epoch % 10 == 0 || epoch == epochs {
        info!(epoch, train_loss, ?valid_loss, "Epoch finished");
    } else {
        debug!(epoch, train_loss, ?valid_loss, "Epoch finished");
    }
}
