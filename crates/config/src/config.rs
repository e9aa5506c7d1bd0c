use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context, anyhow};

/// Default location of the raw listing export.
pub const DEFAULT_RAW_DATA: &str = "data/Car_sale_ads.csv";
/// Default location of the cleaned training dataset.
pub const DEFAULT_DATA: &str = "data/Car_sale_ads_cleaned_v2.csv";
/// Default artifact directory.
pub const DEFAULT_MODEL_DIR: &str = "models";
/// Default target column.
pub const DEFAULT_TARGET: &str = "Price";
/// Default EUR to PLN conversion rate.
pub const DEFAULT_EUR_RATE: f64 = 4.6;

/// Global configuration, loaded once from the environment.
///
/// Holds the load error instead of panicking; use [`config`] to read it.
pub static CONFIG: LazyLock<anyhow::Result<Config>> = LazyLock::new(Config::from_env);

/// Returns the global configuration.
///
/// # Errors
///
/// Returns an error if an environment variable holds an invalid value.
pub fn config() -> anyhow::Result<&'static Config> {
    CONFIG.as_ref().map_err(|e| anyhow!("{e:#}"))
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Raw listing CSV read by the cleaning stage.
    pub raw_data_path: PathBuf,

    /// Cleaned CSV used for training.
    pub data_path: PathBuf,

    /// Directory holding the estimator, schema and UI metadata.
    pub model_dir: PathBuf,

    /// Column the model predicts.
    pub target_column: String,

    /// EUR to PLN rate applied while cleaning.
    pub eur_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw_data_path: PathBuf::from(DEFAULT_RAW_DATA),
            data_path: PathBuf::from(DEFAULT_DATA),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            target_column: DEFAULT_TARGET.to_string(),
            eur_rate: DEFAULT_EUR_RATE,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `CAR_PRICE_RAW_DATA`: raw listing CSV (default: `data/Car_sale_ads.csv`)
    /// - `CAR_PRICE_DATA`: cleaned CSV (default: `data/Car_sale_ads_cleaned_v2.csv`)
    /// - `CAR_PRICE_MODEL_DIR`: artifact directory (default: `models`)
    /// - `CAR_PRICE_TARGET`: target column (default: `Price`)
    /// - `CAR_PRICE_EUR_RATE`: EUR to PLN rate (default: `4.6`)
    ///
    /// # Errors
    ///
    /// Returns an error if `CAR_PRICE_EUR_RATE` is not a positive number.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let path = |key: &str, default: PathBuf| lookup(key).map_or(default, PathBuf::from);

        let eur_rate = match lookup("CAR_PRICE_EUR_RATE") {
            Some(raw) => {
                let rate = raw
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("CAR_PRICE_EUR_RATE is not a number: '{raw}'"))?;
                if !(rate.is_finite() && rate > 0.0) {
                    return Err(anyhow!("CAR_PRICE_EUR_RATE must be positive, got {rate}"));
                }
                rate
            }
            None => defaults.eur_rate,
        };

        Ok(Self {
            raw_data_path: path("CAR_PRICE_RAW_DATA", defaults.raw_data_path),
            data_path: path("CAR_PRICE_DATA", defaults.data_path),
            model_dir: path("CAR_PRICE_MODEL_DIR", defaults.model_dir),
            target_column: lookup("CAR_PRICE_TARGET").unwrap_or(defaults.target_column),
            eur_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.target_column, "Price");
        assert_eq!(config.model_dir, PathBuf::from("models"));
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("CAR_PRICE_MODEL_DIR", "/tmp/models"),
            ("CAR_PRICE_TARGET", "Cena"),
            ("CAR_PRICE_EUR_RATE", " 4.3 "),
        ])
        .unwrap();

        assert_eq!(config.model_dir, PathBuf::from("/tmp/models"));
        assert_eq!(config.target_column, "Cena");
        assert!((config.eur_rate - 4.3).abs() < f64::EPSILON);
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA));
    }

    #[test]
    fn test_invalid_rate_is_an_error() {
        assert!(from_pairs(&[("CAR_PRICE_EUR_RATE", "abc")]).is_err());
        assert!(from_pairs(&[("CAR_PRICE_EUR_RATE", "-1")]).is_err());
    }
}
