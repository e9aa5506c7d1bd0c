//! Widget options derived from the training data.
//!
//! Read only by the presentation layer to fill dropdowns and ranges; never
//! used for prediction.

use std::collections::{BTreeMap, BTreeSet};

use listing_structs::Dataset;
use serde::{Deserialize, Serialize};

use crate::Schema;

/// Column holding the vehicle brand.
pub const BRAND_COLUMN: &str = "Vehicle_brand";
/// Column holding the vehicle model.
pub const MODEL_COLUMN: &str = "Vehicle_model";

/// Range and centre of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumStats {
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

impl NumStats {
    /// Computes stats over present values; all zero when there are none.
    #[must_use]
    pub fn from_values(mut values: Vec<f64>) -> Self {
        values.retain(|v| v.is_finite());
        if values.is_empty() {
            return Self::default();
        }
        values.sort_by(f64::total_cmp);

        let mid = values.len() / 2;
        let median = if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };

        Self {
            min: values[0],
            max: values[values.len() - 1],
            median,
        }
    }
}

/// Dropdown options and numeric ranges for the listing form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UiMetadata {
    /// Sorted unique values per categorical column.
    pub cat_options: BTreeMap<String, Vec<String>>,
    /// Min/max/median per numeric column.
    pub num_stats: BTreeMap<String, NumStats>,
    /// Sorted models offered for each brand.
    pub brand_to_models: BTreeMap<String, Vec<String>>,
}

impl UiMetadata {
    /// Derives the metadata from the labelled (pre-coercion) dataset.
    #[must_use]
    pub fn from_dataset(dataset: &Dataset, schema: &Schema) -> Self {
        let n_rows = dataset.n_rows();

        let cat_options = schema
            .categorical_columns
            .iter()
            .map(|name| {
                let values: BTreeSet<String> = dataset
                    .column(name)
                    .map(|c| {
                        (0..n_rows)
                            .filter_map(|row| c.data.text(row).map(|t| t.into_owned()))
                            .collect()
                    })
                    .unwrap_or_default();
                (name.clone(), values.into_iter().collect())
            })
            .collect();

        let num_stats = schema
            .numeric_columns
            .iter()
            .map(|name| {
                let values = dataset
                    .column(name)
                    .map(|c| (0..n_rows).filter_map(|row| c.data.number(row)).collect())
                    .unwrap_or_default();
                (name.clone(), NumStats::from_values(values))
            })
            .collect();

        let mut brand_to_models: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        if let (Some(brands), Some(models)) =
            (dataset.column(BRAND_COLUMN), dataset.column(MODEL_COLUMN))
        {
            for row in 0..n_rows {
                if let (Some(brand), Some(model)) = (brands.data.text(row), models.data.text(row)) {
                    brand_to_models
                        .entry(brand.into_owned())
                        .or_default()
                        .insert(model.into_owned());
                }
            }
        }

        Self {
            cat_options,
            num_stats,
            brand_to_models: brand_to_models
                .into_iter()
                .map(|(brand, models)| (brand, models.into_iter().collect()))
                .collect(),
        }
    }

    /// Options for a categorical column, empty when unknown.
    #[must_use]
    pub fn options_for(&self, column: &str) -> &[String] {
        self.cat_options.get(column).map(Vec::as_slice).unwrap_or_default()
    }

    /// Models known for a brand, empty when unknown.
    #[must_use]
    pub fn models_for(&self, brand: &str) -> &[String] {
        self.brand_to_models.get(brand).map(Vec::as_slice).unwrap_or_default()
    }
}
