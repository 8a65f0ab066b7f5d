use crate::error::StorageError;
use crate::frame::{bars_to_frame, enriched_to_frame};
use analytics::OutputColumns;
use core_types::{EnrichedRow, PriceBar};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Anything a raw price table can be loaded from.
pub trait BarSource {
    fn load(&self) -> Result<DataFrame, StorageError>;

    /// Loads the table and maps it onto typed bars.
    fn load_bars(&self) -> Result<Vec<PriceBar>, StorageError> {
        Ok(analytics::normalize(self.load()?)?.bars)
    }
}

/// Anything an enriched table can be persisted to.
pub trait TableSink {
    /// Writes the rows and returns how many were written.
    fn write_enriched(
        &self,
        rows: &[EnrichedRow],
        columns: &OutputColumns,
    ) -> Result<usize, StorageError>;
}

/// A single Parquet file used as a table.
#[derive(Debug, Clone)]
pub struct ParquetStore {
    path: PathBuf,
}

impl ParquetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Writes raw bars in the normalized column layout.
    pub fn write_bars(&self, bars: &[PriceBar]) -> Result<usize, StorageError> {
        let mut df = bars_to_frame(bars)?;
        self.write_frame(&mut df)?;
        Ok(bars.len())
    }

    fn write_frame(&self, df: &mut DataFrame) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut file = File::create(&self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        ParquetWriter::new(&mut file).finish(df)?;
        tracing::info!("Wrote {} rows to {}", df.height(), self.path.display());
        Ok(())
    }
}

impl BarSource for ParquetStore {
    fn load(&self) -> Result<DataFrame, StorageError> {
        let file = File::open(&self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        let df = ParquetReader::new(file).finish()?;
        tracing::info!("Loaded {} rows from {}", df.height(), self.path.display());
        Ok(df)
    }
}

impl TableSink for ParquetStore {
    fn write_enriched(
        &self,
        rows: &[EnrichedRow],
        columns: &OutputColumns,
    ) -> Result<usize, StorageError> {
        let mut df = enriched_to_frame(rows, columns)?;
        self.write_frame(&mut df)?;
        Ok(rows.len())
    }
}
