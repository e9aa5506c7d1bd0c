use thiserror::Error;

/// Errors raised while deriving a [`Schema`](crate::Schema).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("column '{column}' not found in data; available: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("no rows left with a value for target '{target}'")]
    EmptyDataset { target: String },

    #[error("no feature columns left besides target '{target}' and identifiers")]
    NoFeatures { target: String },

    #[error("inconsistent schema: {0}")]
    InconsistentSchema(String),
}
