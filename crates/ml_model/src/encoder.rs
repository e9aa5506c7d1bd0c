//! Turning mixed-type feature rows into standardised numeric vectors.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use anyhow::bail;
use listing_structs::{FeatureFrame, FeatureValue};
use serde::{Deserialize, Serialize};

/// Pseudo-count pulling rare categories towards the prior.
const SMOOTHING: f64 = 10.0;

/// How one input column is mapped to a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnEncoding {
    /// Z-score with the training mean and standard deviation.
    Numeric { mean: f64, std: f64 },
    /// Smoothed mean of the standardised target per category.
    Category {
        levels: BTreeMap<String, f64>,
        prior: f64,
    },
}

impl ColumnEncoding {
    fn encode(&self, value: &FeatureValue) -> f64 {
        match self {
            Self::Numeric { mean, std } => (value.as_number().unwrap_or(0.0) - mean) / std,
            Self::Category { levels, prior } => {
                levels.get(category_key(value).as_ref()).copied().unwrap_or(*prior)
            }
        }
    }
}

fn category_key(value: &FeatureValue) -> Cow<'_, str> {
    value
        .as_category()
        .map_or_else(|| Cow::Owned(value.to_string()), Cow::Borrowed)
}

/// Encoder fitted on the training split only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    columns: Vec<ColumnEncoding>,
    target_mean: f64,
    target_std: f64,
}

impl FeatureEncoder {
    /// Fits column encodings and target scaling.
    ///
    /// Columns listed in `categorical` are target-encoded, every other
    /// column is standardised. A zero spread is treated as 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is empty, the target length differs
    /// from the row count, or a categorical index is out of range.
    pub fn fit(frame: &FeatureFrame, target: &[f64], categorical: &[usize]) -> anyhow::Result<Self> {
        if frame.is_empty() {
            bail!("Cannot fit an encoder on an empty frame");
        }
        if frame.len() != target.len() {
            bail!(
                "Frame has {} rows but target has {} values",
                frame.len(),
                target.len()
            );
        }
        let n_columns = frame.columns().len();
        if let Some(bad) = categorical.iter().find(|&&idx| idx >= n_columns) {
            bail!("Categorical index {bad} out of range for {n_columns} columns");
        }

        let (target_mean, target_std) = mean_std(target.iter().copied());
        let scaled: Vec<f64> = target.iter().map(|y| (y - target_mean) / target_std).collect();
        let prior = scaled.iter().sum::<f64>() / scaled.len() as f64;

        let columns = (0..n_columns)
            .map(|col| {
                let cells = frame.rows().iter().map(move |row| &row[col]);
                if categorical.contains(&col) {
                    let mut totals: HashMap<String, (f64, f64)> = HashMap::new();
                    for (value, y) in cells.zip(&scaled) {
                        let entry = totals.entry(category_key(value).into_owned()).or_default();
                        entry.0 += y;
                        entry.1 += 1.0;
                    }
                    let levels = totals
                        .into_iter()
                        .map(|(level, (sum, count))| {
                            (level, SMOOTHING.mul_add(prior, sum) / (count + SMOOTHING))
                        })
                        .collect();
                    ColumnEncoding::Category { levels, prior }
                } else {
                    let (mean, std) = mean_std(cells.map(|v| v.as_number().unwrap_or(0.0)));
                    ColumnEncoding::Numeric { mean, std }
                }
            })
            .collect();

        Ok(Self {
            columns,
            target_mean,
            target_std,
        })
    }

    /// Number of encoded inputs.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnEncoding] {
        &self.columns
    }

    /// Encodes one row. Extra cells beyond the fitted columns are ignored.
    #[must_use]
    pub fn encode_row(&self, row: &[FeatureValue]) -> Vec<f64> {
        self.columns
            .iter()
            .zip(row)
            .map(|(encoding, value)| encoding.encode(value))
            .collect()
    }

    #[must_use]
    pub fn scale_target(&self, y: f64) -> f64 {
        (y - self.target_mean) / self.target_std
    }

    #[must_use]
    pub fn unscale_target(&self, score: f64) -> f64 {
        score.mul_add(self.target_std, self.target_mean)
    }
}

fn mean_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let (sum, count) = values.clone().fold((0.0, 0.0), |(s, c), v| (s + v, c + 1.0));
    if count == 0.0 {
        return (0.0, 1.0);
    }
    let mean = sum / count;
    let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    let std = var.sqrt();
    (mean, if std > f64::EPSILON { std } else { 1.0 })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn frame() -> (FeatureFrame, Vec<f64>) {
        let mut frame = FeatureFrame::new(vec!["Brand".into(), "Mileage_km".into()]);
        let rows = [("Audi", 10.0), ("Audi", 20.0), ("Fiat", 30.0), ("Fiat", 40.0)];
        for (brand, km) in rows {
            frame.push(vec![
                FeatureValue::Category(brand.into()),
                FeatureValue::Number(km),
            ]);
        }
        (frame, vec![200.0, 200.0, 100.0, 100.0])
    }

    #[test]
    fn test_numeric_columns_standardised() {
        let (frame, target) = frame();
        let encoder = FeatureEncoder::fit(&frame, &target, &[0]).unwrap();

        let encoded: Vec<f64> = frame
            .rows()
            .iter()
            .map(|row| encoder.encode_row(row)[1])
            .collect();
        let mean = encoded.iter().sum::<f64>() / 4.0;
        let var = encoded.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
        assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
        assert_relative_eq!(var, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_categories_follow_target_and_unseen_gets_prior() {
        let (frame, target) = frame();
        let encoder = FeatureEncoder::fit(&frame, &target, &[0]).unwrap();

        let audi = encoder.encode_row(&frame.rows()[0])[0];
        let fiat = encoder.encode_row(&frame.rows()[2])[0];
        assert!(audi > 0.0 && fiat < 0.0);
        // 2 rows at +1 shrunk by 10 pseudo-counts at prior 0.
        assert_relative_eq!(audi, 2.0 / 12.0, epsilon = 1e-12);

        let unseen = encoder.encode_row(&[
            FeatureValue::Category("Lada".into()),
            FeatureValue::Number(25.0),
        ]);
        assert_relative_eq!(unseen[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(unseen[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_target_scaling_inverts() {
        let (frame, target) = frame();
        let encoder = FeatureEncoder::fit(&frame, &target, &[0]).unwrap();

        assert_relative_eq!(encoder.scale_target(200.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(encoder.unscale_target(encoder.scale_target(123.4)), 123.4, epsilon = 1e-9);
    }

    #[test]
    fn test_constant_column_does_not_divide_by_zero() {
        let mut frame = FeatureFrame::new(vec!["Doors_number".into()]);
        frame.push(vec![FeatureValue::Number(5.0)]);
        frame.push(vec![FeatureValue::Number(5.0)]);
        let encoder = FeatureEncoder::fit(&frame, &[1.0, 1.0], &[]).unwrap();

        assert_eq!(encoder.encode_row(&[FeatureValue::Number(5.0)]), [0.0]);
        assert!(encoder.scale_target(1.0).is_finite());
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let (frame, target) = frame();
        assert!(FeatureEncoder::fit(&frame, &target[..2], &[0]).is_err());
        assert!(FeatureEncoder::fit(&frame, &target, &[7]).is_err());
        assert!(FeatureEncoder::fit(&FeatureFrame::new(vec![]), &[], &[]).is_err());
    }
}
