//! # Storage Crate
//!
//! This crate is the file-backed archive of the pipeline: the raw daily price
//! table goes in, the enriched table comes out, both as Parquet.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** all file-format details live here. The rest of the
//!   application sees `PriceBar`s and `EnrichedRow`s, never Parquet.
//! - **Traits at the seam:** `BarSource` and `TableSink` are what callers depend
//!   on, so a different backing store only needs a new implementation.
//! - **Incremental ingest:** `plan_fetch` and `merge_bars` keep repeated
//!   downloads from duplicating `(ticker, date)` rows.
//!
//! ## Public API
//!
//! - `ParquetStore`: a single Parquet file implementing both traits.
//! - `bars_to_frame` / `enriched_to_frame`: typed rows to polars `DataFrame`s.
//! - `plan_fetch` / `merge_bars`: incremental download bookkeeping.
//! - `StorageError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod frame;
pub mod ingest;
pub mod parquet;

// Re-export the key components to create a clean, public-facing API.
pub use error::StorageError;
pub use frame::{bars_to_frame, enriched_to_frame};
pub use ingest::{merge_bars, plan_fetch, FetchPlan, FetchWindow};
pub use parquet::{BarSource, ParquetStore, TableSink};
