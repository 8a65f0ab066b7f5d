//! # Enrichment Engine
//!
//! This crate turns raw daily price bars into per-bar analytics: returns,
//! volatility, trend averages, drawdown, Sharpe/Sortino-style ratios, and
//! beta/alpha against a benchmark.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no file or network access. Tables come in as polars
//!   `DataFrame`s and leave as typed `EnrichedRow`s; persistence lives in the
//!   `storage` crate.
//! - **Explicit configuration:** window lengths and the benchmark ticker are
//!   passed in as an `EnrichmentConfig`, never read from globals.
//! - **Undefined is data:** a metric whose window is not full, or whose divisor
//!   is zero, is `None` (or a signed infinity), never an error. Only schema
//!   problems abort a run.
//!
//! ## Public API
//!
//! - `normalize`: canonicalises a raw table and maps it onto `PriceBar`s.
//! - `extract_benchmark` / `BenchmarkReturns`: the shared benchmark series.
//! - `Enricher`: the per-instrument computation.
//! - `Aggregator`: partitions a table by ticker and enriches it in parallel.
//! - `enrich_table`: the whole pipeline in one call.

// Declare the modules that constitute this crate.
pub mod aggregator;
pub mod benchmark;
pub mod enricher;
pub mod error;
pub mod report;
mod rolling;
pub mod schema;

// Re-export the key components to create a clean, public-facing API.
pub use aggregator::{partition, Aggregator, Enrichment};
pub use benchmark::{extract_benchmark, BenchmarkReturns};
pub use enricher::Enricher;
pub use error::{AnalyticsError, SchemaError};
pub use report::{InstrumentSnapshot, RunSummary};
pub use schema::{normalize, normalize_columns, NormalizedTable, OutputColumns, PriceSource};

use configuration::EnrichmentConfig;
use polars::prelude::DataFrame;

/// Normalizes `df` and enriches every instrument in it.
pub fn enrich_table(
    df: DataFrame,
    config: &EnrichmentConfig,
) -> Result<Enrichment, AnalyticsError> {
    let table = normalize(df)?;
    Aggregator::new(config.clone()).run(table.bars)
}
