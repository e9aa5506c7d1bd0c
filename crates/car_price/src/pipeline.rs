//! Offline training: from a labelled dataset to a saved-ready artifact bundle.

use burn::tensor::backend::AutodiffBackend;
use feature_schema::{Metrics, SchemaBuilder, UiMetadata};
use listing_structs::Dataset;
use ml_model::{Regressor, SplitIndices, TrainingConfig, TrainingData, TrainingOutput, split_indices};
use tracing::{info, warn};

use crate::ArtifactBundle;

/// Number of columns reported in the importance ranking.
const TOP_FEATURES: usize = 20;

/// Settings for one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Column the model predicts.
    pub target_column: String,
    /// Fit on `ln(1 + target)` and invert at prediction time.
    pub use_log_target: bool,
    /// Share of rows held out for the final evaluation.
    pub test_fraction: f64,
    /// Share of the remaining rows used for early stopping.
    pub valid_fraction: f64,
    /// Seed for the row split.
    pub seed: u64,
    pub training: TrainingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: "Price".to_string(),
            use_log_target: true,
            test_fraction: 0.2,
            valid_fraction: 0.2,
            seed: 42,
            training: TrainingConfig::default(),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn new<S: Into<String>>(target_column: S) -> Self {
        Self {
            target_column: target_column.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_log_target(mut self, use_log_target: bool) -> Self {
        self.use_log_target = use_log_target;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }
}

/// Everything a training run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Estimator, schema (with metrics and best iteration) and UI metadata.
    pub bundle: ArtifactBundle,
    pub training: TrainingOutput,
    /// Row positions, within the labelled rows, of each split.
    pub split: SplitIndices,
    /// Input columns ranked by first-layer weight mass, strongest first.
    pub feature_importance: Vec<(String, f64)>,
}

/// Runs schema derivation, splitting, fitting and evaluation in order.
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    config: PipelineConfig,
}

impl TrainingPipeline {
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Trains on `dataset` and returns the artifacts.
    ///
    /// # Errors
    ///
    /// Fails with a [`feature_schema::SchemaError`] when the target column is
    /// missing, no row has a target or no feature column is left, and with
    /// other errors when fitting or scoring fails.
    pub fn run<B: AutodiffBackend>(
        &self,
        dataset: &Dataset,
        device: &B::Device,
    ) -> anyhow::Result<PipelineOutput> {
        let config = &self.config;

        info!(target = %config.target_column, rows = dataset.n_rows(), "Step 1/6: Building schema");
        let builder =
            SchemaBuilder::new(config.target_column.as_str()).with_log_target(config.use_log_target);
        let labelled = builder.labelled_rows(dataset)?;
        let matrix = builder.build_labelled(&labelled)?;
        let mut schema = matrix.schema;
        let ui_metadata = UiMetadata::from_dataset(&labelled, &schema);
        info!(
            features = schema.feature_columns.len(),
            categorical = schema.categorical_columns.len(),
            numeric = schema.numeric_columns.len(),
            "Schema ready"
        );

        info!("Step 2/6: Splitting rows");
        let data = TrainingData::new(matrix.features, matrix.target);
        let split = split_indices(
            data.len(),
            config.test_fraction,
            config.valid_fraction,
            config.seed,
        );
        info!(
            train = split.train.len(),
            valid = split.valid.len(),
            test = split.test.len(),
            seed = config.seed,
            "Split rows"
        );

        info!(use_log_target = config.use_log_target, "Step 3/6: Preparing targets");
        let transform = |mut part: TrainingData| {
            if config.use_log_target {
                part.target.iter_mut().for_each(|y| *y = y.ln_1p());
            }
            part
        };
        let train = transform(data.select(&split.train));
        let valid = transform(data.select(&split.valid));
        let test = data.select(&split.test);

        info!("Step 4/6: Fitting estimator");
        let categorical = schema.categorical_indices();
        let trained = ml_model::train::<B>(device, &train, &valid, &categorical, &config.training)?;
        let regressor = trained.regressor;

        info!("Step 5/6: Evaluating on the test split");
        let metrics = if test.is_empty() {
            warn!("No test rows, skipping evaluation");
            None
        } else {
            let predicted: Vec<f64> = regressor
                .predict(&test.features)?
                .into_iter()
                .map(|score| schema.invert_target(score))
                .collect();
            Metrics::compute(&test.target, &predicted)
        };
        if let Some(m) = &metrics {
            info!(r2 = m.r2, mae = m.mae, rmse = m.rmse, "Test metrics");
        }

        info!("Step 6/6: Assembling artifacts");
        schema.metrics = metrics;
        schema.best_iteration = Some(trained.output.best_epoch);

        let mut feature_importance = regressor.input_weight_mass();
        feature_importance.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (rank, (column, weight)) in feature_importance.iter().take(TOP_FEATURES).enumerate() {
            info!(rank = rank + 1, column = %column, weight, "Feature importance");
        }

        Ok(PipelineOutput {
            bundle: ArtifactBundle {
                regressor,
                schema,
                ui_metadata: Some(ui_metadata),
            },
            training: trained.output,
            split,
            feature_importance,
        })
    }
}
