//! Car price estimator
//!
//! Cleans used-car listing exports, trains a price model and predicts
//! prices for partially filled listings.

use std::path::PathBuf;

use anyhow::Result;
use car_price::PipelineConfig;
use car_price::commands::{clean, options, predict, train};
use clap::{Parser, Subcommand};
use ml_model::TrainingConfig;
use tracing_subscriber::EnvFilter;

/// Car price estimator
#[derive(Parser)]
#[command(name = "car-price")]
#[command(about = "Train and query a used-car price model")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a raw listing export into the training CSV
    Clean {
        /// Raw CSV (default: `CAR_PRICE_RAW_DATA`)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Cleaned CSV to write (default: `CAR_PRICE_DATA`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// PLN per EUR (default: `CAR_PRICE_EUR_RATE`)
        #[arg(long)]
        eur_rate: Option<f64>,
    },

    /// Train the price model and write its artifacts
    Train {
        /// Cleaned CSV (default: `CAR_PRICE_DATA`)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Artifact directory (default: `CAR_PRICE_MODEL_DIR`)
        #[arg(short, long)]
        model_dir: Option<PathBuf>,

        /// Target column (default: `CAR_PRICE_TARGET`)
        #[arg(short, long)]
        target: Option<String>,

        /// Fit on raw prices instead of log prices
        #[arg(long)]
        raw_target: bool,

        /// Maximum number of training epochs
        #[arg(short, long, default_value = "500")]
        epochs: usize,

        /// Batch size for training
        #[arg(short, long, default_value = "64")]
        batch_size: usize,

        /// Learning rate
        #[arg(short, long, default_value = "0.001")]
        learning_rate: f64,

        /// Epochs without validation improvement before stopping
        #[arg(long, default_value = "20")]
        patience: usize,

        /// Seed for the row split and shuffling
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Predict the price of one listing
    Predict {
        /// Artifact directory (default: `CAR_PRICE_MODEL_DIR`)
        #[arg(short, long)]
        model_dir: Option<PathBuf>,

        /// Listing fields as a JSON object
        #[arg(short, long)]
        input: Option<String>,

        /// File holding a JSON object of listing fields
        #[arg(long)]
        input_file: Option<PathBuf>,

        /// Single field as KEY=VALUE, repeatable
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Show dropdown options recorded at training time
    Options {
        /// Artifact directory (default: `CAR_PRICE_MODEL_DIR`)
        #[arg(short, long)]
        model_dir: Option<PathBuf>,

        /// Only list the models of this brand
        #[arg(short, long)]
        brand: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = config::config()?;

    match cli.command {
        Commands::Clean {
            input,
            output,
            eur_rate,
        } => {
            clean::run(
                &input.unwrap_or_else(|| config.raw_data_path.clone()),
                &output.unwrap_or_else(|| config.data_path.clone()),
                eur_rate.unwrap_or(config.eur_rate),
            )?;
        }
        Commands::Train {
            data,
            model_dir,
            target,
            raw_target,
            epochs,
            batch_size,
            learning_rate,
            patience,
            seed,
        } => {
            let training = TrainingConfig::default()
                .with_epochs(epochs)
                .with_batch_size(batch_size)
                .with_learning_rate(learning_rate)
                .with_patience(patience)
                .with_seed(seed);
            let pipeline_config = PipelineConfig::new(
                target.unwrap_or_else(|| config.target_column.clone()),
            )
            .with_log_target(!raw_target)
            .with_seed(seed)
            .with_training(training);

            train::run(
                &data.unwrap_or_else(|| config.data_path.clone()),
                &model_dir.unwrap_or_else(|| config.model_dir.clone()),
                pipeline_config,
            )?;
        }
        Commands::Predict {
            model_dir,
            input,
            input_file,
            set,
        } => {
            let user_input = predict::collect_input(input.as_deref(), input_file.as_deref(), &set)?;
            predict::run(
                &model_dir.unwrap_or_else(|| config.model_dir.clone()),
                &user_input,
            )?;
        }
        Commands::Options { model_dir, brand } => {
            options::run(
                &model_dir.unwrap_or_else(|| config.model_dir.clone()),
                brand.as_deref(),
            )?;
        }
    }

    Ok(())
}
