//! Options command - shows the dropdown values recorded at training time.

use std::path::Path;

use anyhow::Result;
use feature_schema::UiMetadata;
use tracing::{info, warn};

use crate::ArtifactBundle;

/// Prints the UI metadata, or only the models of `brand` when given.
///
/// Returns the metadata that was printed; `None` when it is unavailable,
/// which is not an error.
///
/// # Errors
///
/// Returns an error only if printing fails.
pub fn run(model_dir: &Path, brand: Option<&str>) -> Result<Option<UiMetadata>> {
    let Some(metadata) = ArtifactBundle::load_ui_metadata(model_dir) else {
        warn!(
            model_dir = %model_dir.display(),
            "No UI metadata available, train a model to populate the options"
        );
        return Ok(None);
    };

    if let Some(brand) = brand {
        let models = metadata.models_for(brand);
        info!(brand, models = models.len(), "Models for brand");
        println!("{}", serde_json::to_string_pretty(models)?);
    } else {
        info!(
            categorical = metadata.cat_options.len(),
            numeric = metadata.num_stats.len(),
            brands = metadata.brand_to_models.len(),
            "UI metadata"
        );
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    }

    Ok(Some(metadata))
}
