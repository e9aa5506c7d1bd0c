//! Predict command - estimates the price of one listing.

use std::path::Path;

use anyhow::{Context, Result, bail};
use feature_schema::{FieldValue, UserInput};
use tracing::info;

use crate::{ArtifactBundle, InferenceService, Prediction};

/// Merges the listing fields given on the command line.
///
/// Later sources win: the JSON file, then inline JSON, then `KEY=VALUE` pairs.
///
/// # Errors
///
/// Returns an error if a JSON source is not an object or a pair has no `=`.
pub fn collect_input(
    input_json: Option<&str>,
    input_file: Option<&Path>,
    pairs: &[String],
) -> Result<UserInput> {
    let mut input = UserInput::new();

    if let Some(path) = input_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let parsed: UserInput = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a JSON object of listing fields", path.display()))?;
        input.extend(parsed);
    }

    if let Some(json) = input_json {
        let parsed: UserInput =
            serde_json::from_str(json).context("--input is not a JSON object of listing fields")?;
        input.extend(parsed);
    }

    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Expected KEY=VALUE, got '{pair}'");
        };
        input.insert(key.trim().to_string(), FieldValue::parse_loose(value.trim()));
    }

    Ok(input)
}

/// Runs the predict command and prints the estimate with its feature row.
///
/// # Errors
///
/// Returns an error if the artifacts are missing or inconsistent.
pub fn run(model_dir: &Path, input: &UserInput) -> Result<Prediction> {
    info!(model_dir = %model_dir.display(), fields = input.len(), "Predicting price");

    let service = InferenceService::from_bundle(ArtifactBundle::load(model_dir)?)?;
    let prediction = service.predict(input)?;

    info!(price = prediction.price, "Prediction complete");
    println!("{}", serde_json::to_string_pretty(&prediction)?);

    Ok(prediction)
}
