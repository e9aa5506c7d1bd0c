//! Feature schema crate.
//!
//! The contract between training and inference: which columns the estimator
//! sees, in which order, with which types, and how any value (training cell
//! or loosely typed user input) is coerced into a feature cell.
//!
//! - [`SchemaBuilder`] derives a [`Schema`] and the training matrix from a dataset.
//! - [`build_row`] turns a partial user input into a schema-ordered [`FeatureRow`].
//! - [`UiMetadata`] holds widget options derived from the same dataset.

mod builder;
mod coerce;
mod error;
mod metrics;
mod row;
mod schema;
mod ui_metadata;

pub use builder::{IDENTIFIER_COLUMN, SchemaBuilder, TrainingMatrix};
pub use coerce::{coerce_categorical, coerce_numeric, is_absent_literal};
pub use error::SchemaError;
pub use metrics::Metrics;
pub use row::build_row;
pub use schema::Schema;
pub use ui_metadata::{BRAND_COLUMN, MODEL_COLUMN, NumStats, UiMetadata};

#[doc(no_inline)]
pub use listing_structs::{FeatureFrame, FeatureRow, FeatureValue, FieldValue, NO_DATA, UserInput};
