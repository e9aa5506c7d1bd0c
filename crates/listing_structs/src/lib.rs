//! Common structs for car listings shared across crates.
//!
//! A [`Dataset`] is the typed, column-oriented table loaded from listing
//! exports. A [`FeatureRow`] / [`FeatureFrame`] is what the estimator scores.

mod dataset;
mod row;
mod value;

pub use dataset::*;
pub use row::*;
pub use value::*;

/// Placeholder substituted for any missing or unparsable categorical value.
pub const NO_DATA: &str = "Brak danych";
