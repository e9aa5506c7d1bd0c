//! Used-car price estimation.
//!
//! Trains a price model on cleaned listing exports and serves predictions
//! for partially filled listing forms.
//!
//! - [`TrainingPipeline`] derives the schema, splits the rows, fits the
//!   estimator with early stopping and evaluates it in price units.
//! - [`InferenceService`] scores one listing against loaded artifacts and
//!   is safe to share across threads.
//! - [`ArtifactBundle`] reads and writes estimator, schema and UI metadata
//!   together.

pub mod artifacts;
pub mod commands;
pub mod inference;
pub mod pipeline;

pub use artifacts::{ArtifactBundle, ArtifactError};
pub use inference::{InferenceService, Prediction, check_coupling, predict};
pub use pipeline::{PipelineConfig, PipelineOutput, TrainingPipeline};
