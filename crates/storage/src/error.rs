use analytics::AnalyticsError;
use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read or write a Parquet table: {0}")]
    Polars(#[from] PolarsError),

    #[error("The stored table could not be interpreted: {0}")]
    Analytics(#[from] AnalyticsError),
}
