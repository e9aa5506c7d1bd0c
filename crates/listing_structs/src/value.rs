use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A user-supplied value for a single form field.
///
/// Deserializes from a JSON number, string, bool or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Flag(bool),
    Missing,
}

impl FieldValue {
    /// Parses loosely typed CLI text: numbers become [`FieldValue::Number`].
    #[must_use]
    pub fn parse_loose(raw: &str) -> Self {
        raw.trim()
            .parse::<f64>()
            .map_or_else(|_| Self::Text(raw.to_string()), Self::Number)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl<T: Into<Self>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

/// Field name to user-supplied value. Partial mappings and extra keys are fine.
pub type UserInput = HashMap<String, FieldValue>;

/// A fully-typed feature cell, as seen by the estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

impl FeatureValue {
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Category(_) => None,
        }
    }

    #[must_use]
    pub fn as_category(&self) -> Option<&str> {
        match self {
            Self::Category(v) => Some(v),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Category(v) => f.write_str(v),
        }
    }
}
