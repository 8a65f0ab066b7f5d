use configuration::error::ConfigError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Problems with the shape of an input table. Always fatal for a run.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Neither 'adj_close' nor 'close' is present (columns: {available:?})")]
    MissingPriceColumn { available: Vec<String> },

    #[error("Required column '{0}' is missing")]
    MissingColumn(String),

    #[error("Column '{0}' appears more than once after normalization")]
    DuplicateColumn(String),

    #[error("Column '{column}' is null at row {row}")]
    NullKey { column: String, row: usize },

    #[error("Column '{column}' has unsupported type {dtype}")]
    UnsupportedType { column: String, dtype: String },

    #[error("Row {row} has an unparseable date '{value}'")]
    InvalidDate { row: usize, value: String },
}

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Table error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Invalid enrichment configuration: {0}")]
    Config(#[from] ConfigError),
}
