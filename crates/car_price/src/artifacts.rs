//! Reading and writing the trained model as one unit.

use std::fs;
use std::path::{Path, PathBuf};

use feature_schema::{Schema, SchemaError, UiMetadata};
use ml_model::PriceRegressor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{info, warn};

use crate::inference::check_coupling;

/// File holding the frozen estimator.
pub const MODEL_FILE: &str = "price_model.json";
/// File holding the feature schema.
pub const SCHEMA_FILE: &str = "feature_schema.json";
/// File holding the optional dropdown metadata.
pub const UI_METADATA_FILE: &str = "ui_metadata.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The model has not been trained into this directory yet.
    #[error("model unavailable: {} not found, run `car-price train` first", .path.display())]
    ArtifactNotFound { path: PathBuf },

    #[error("schema columns {found:?} do not match the estimator's columns {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("invalid estimator: {0}")]
    InvalidEstimator(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Estimator, schema and UI metadata from one training run.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub regressor: PriceRegressor,
    pub schema: Schema,
    pub ui_metadata: Option<UiMetadata>,
}

impl ArtifactBundle {
    /// Writes every artifact into `dir`, creating it if needed.
    ///
    /// Without UI metadata, any metadata file left by an earlier run is
    /// removed so it cannot describe the new schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or a file cannot be written.
    pub fn save(&self, dir: &Path) -> Result<(), ArtifactError> {
        fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        write_json(&dir.join(MODEL_FILE), &self.regressor)?;
        write_json(&dir.join(SCHEMA_FILE), &self.schema)?;
        let metadata_path = dir.join(UI_METADATA_FILE);
        match &self.ui_metadata {
            Some(metadata) => write_json(&metadata_path, metadata)?,
            None => match fs::remove_file(&metadata_path) {
                Ok(()) => info!(path = %metadata_path.display(), "Removed stale UI metadata"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(ArtifactError::Io {
                        path: metadata_path,
                        source,
                    });
                }
            },
        }

        info!(dir = %dir.display(), "Saved model artifacts");
        Ok(())
    }

    /// Loads the estimator and schema from `dir` and checks they belong together.
    ///
    /// UI metadata is loaded on a best-effort basis; see [`Self::load_ui_metadata`].
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::ArtifactNotFound`] if either required file is
    /// missing, [`ArtifactError::InvalidSchema`] if the schema breaks its
    /// column partition and [`ArtifactError::SchemaMismatch`] if estimator
    /// and schema disagree.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let model_path = dir.join(MODEL_FILE);
        let schema_path = dir.join(SCHEMA_FILE);
        for path in [&model_path, &schema_path] {
            if !path.is_file() {
                return Err(ArtifactError::ArtifactNotFound { path: path.clone() });
            }
        }

        let regressor: PriceRegressor = read_json(&model_path)?;
        regressor
            .check()
            .map_err(|e| ArtifactError::InvalidEstimator(format!("{e:#}")))?;
        let schema: Schema = read_json(&schema_path)?;
        schema.validate()?;
        check_coupling(&regressor, &schema)?;

        info!(
            dir = %dir.display(),
            features = schema.feature_columns.len(),
            use_log_target = schema.use_log_target,
            "Loaded model artifacts"
        );

        Ok(Self {
            regressor,
            schema,
            ui_metadata: Self::load_ui_metadata(dir),
        })
    }

    /// Loads the UI metadata, if present and readable.
    ///
    /// Never fails: a missing or broken file is logged and yields `None`.
    #[must_use]
    pub fn load_ui_metadata(dir: &Path) -> Option<UiMetadata> {
        let path = dir.join(UI_METADATA_FILE);
        if !path.is_file() {
            warn!(path = %path.display(), "UI metadata not found, widgets fall back to free text");
            return None;
        }
        match read_json(&path) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable UI metadata");
                None
            }
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let text = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use feature_schema::{FeatureFrame, FeatureValue, NumStats};
    use ml_model::{DenseLayer, FeatureEncoder, Regressor};
    use tempfile::TempDir;

    use super::*;

    fn bundle() -> ArtifactBundle {
        let columns: Vec<String> = vec!["Brand".into(), "Mileage_km".into()];
        let mut frame = FeatureFrame::new(columns.clone());
        frame.push(vec![FeatureValue::Category("Audi".into()), FeatureValue::Number(10.0)]);
        frame.push(vec![FeatureValue::Category("Fiat".into()), FeatureValue::Number(30.0)]);
        let encoder = FeatureEncoder::fit(&frame, &[11.0, 9.0], &[0]).unwrap();

        let layers = vec![DenseLayer {
            weights: vec![0.5, -0.25],
            bias: vec![0.1],
            d_in: 2,
            d_out: 1,
            relu: false,
        }];
        let regressor = PriceRegressor::new(columns.clone(), vec![0], encoder, layers).unwrap();

        let schema = Schema {
            feature_columns: columns,
            categorical_columns: vec!["Brand".into()],
            numeric_columns: vec!["Mileage_km".into()],
            target_column: "Price".into(),
            use_log_target: true,
            metrics: None,
            best_iteration: Some(7),
        };

        let mut ui_metadata = UiMetadata::default();
        ui_metadata
            .cat_options
            .insert("Brand".into(), vec!["Audi".into(), "Fiat".into()]);
        ui_metadata.num_stats.insert(
            "Mileage_km".into(),
            NumStats {
                min: 10.0,
                max: 30.0,
                median: 20.0,
            },
        );

        ArtifactBundle {
            regressor,
            schema,
            ui_metadata: Some(ui_metadata),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let original = bundle();
        original.save(dir.path()).unwrap();

        let loaded = ArtifactBundle::load(dir.path()).unwrap();
        assert_eq!(loaded.schema, original.schema);
        assert_eq!(loaded.regressor, original.regressor);
        assert_eq!(loaded.ui_metadata, original.ui_metadata);
        assert_eq!(loaded.regressor.feature_columns(), loaded.schema.feature_columns.as_slice());
    }

    #[test]
    fn test_missing_files_are_not_found() {
        let dir = TempDir::new().unwrap();
        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::ArtifactNotFound { .. }));

        bundle().save(dir.path()).unwrap();
        fs::remove_file(dir.path().join(SCHEMA_FILE)).unwrap();
        match ArtifactBundle::load(dir.path()).unwrap_err() {
            ArtifactError::ArtifactNotFound { path } => assert!(path.ends_with(SCHEMA_FILE)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mismatched_schema_is_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let mut bundle = bundle();
        bundle.schema.feature_columns.reverse();
        bundle.save(dir.path()).unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_ui_metadata_is_optional() {
        let dir = TempDir::new().unwrap();
        let mut bundle = bundle();
        bundle.ui_metadata = None;
        bundle.save(dir.path()).unwrap();
        assert!(ArtifactBundle::load(dir.path()).unwrap().ui_metadata.is_none());

        fs::write(dir.path().join(UI_METADATA_FILE), "{ not json").unwrap();
        let loaded = ArtifactBundle::load(dir.path()).unwrap();
        assert!(loaded.ui_metadata.is_none());
    }

    #[test]
    fn test_save_without_metadata_removes_stale_file() {
        let dir = TempDir::new().unwrap();
        bundle().save(dir.path()).unwrap();
        assert!(dir.path().join(UI_METADATA_FILE).is_file());

        let mut retrained = bundle();
        retrained.ui_metadata = None;
        retrained.save(dir.path()).unwrap();

        assert!(!dir.path().join(UI_METADATA_FILE).exists());
        assert!(ArtifactBundle::load(dir.path()).unwrap().ui_metadata.is_none());
    }

    #[test]
    fn test_schema_breaking_partition_is_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let mut bundle = bundle();
        bundle.schema.numeric_columns.clear();
        bundle.save(dir.path()).unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::InvalidSchema(SchemaError::InconsistentSchema(_))
        ));
    }

    #[test]
    fn test_corrupt_estimator_is_json_error() {
        let dir = TempDir::new().unwrap();
        bundle().save(dir.path()).unwrap();
        fs::write(dir.path().join(MODEL_FILE), "[]").unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Json { .. }));
    }
}
