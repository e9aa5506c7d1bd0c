//! Train command - fits the price model on the cleaned listings.

use std::path::Path;

use anyhow::{Context, Result};
use listing_cleaner::read_csv;
use tracing::info;

use super::{TrainBackend, init_device};
use crate::{PipelineConfig, PipelineOutput, TrainingPipeline};

/// Runs the train command and writes the artifacts to `model_dir`.
///
/// # Errors
///
/// Returns an error if the data cannot be loaded, training fails, or the
/// artifacts cannot be written.
pub fn run(data_path: &Path, model_dir: &Path, config: PipelineConfig) -> Result<PipelineOutput> {
    info!(
        data = %data_path.display(),
        model_dir = %model_dir.display(),
        target = %config.target_column,
        use_log_target = config.use_log_target,
        epochs = config.training.epochs,
        batch_size = config.training.batch_size,
        learning_rate = config.training.learning_rate,
        "Starting training"
    );

    let dataset = read_csv(data_path)
        .with_context(|| format!("Failed to load training data from {}", data_path.display()))?;
    info!(rows = dataset.n_rows(), columns = dataset.columns().len(), "Loaded dataset");

    let device = init_device();
    let output = TrainingPipeline::new(config).run::<TrainBackend>(&dataset, &device)?;

    output.bundle.save(model_dir)?;

    let schema = &output.bundle.schema;
    info!(
        best_iteration = ?schema.best_iteration,
        epochs_completed = output.training.epochs_completed,
        early_stopped = output.training.early_stopped,
        r2 = ?schema.metrics.map(|m| m.r2),
        mae = ?schema.metrics.map(|m| m.mae),
        rmse = ?schema.metrics.map(|m| m.rmse),
        "Training complete"
    );

    Ok(output)
}
