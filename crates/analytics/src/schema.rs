//! Maps an arbitrary raw price table onto typed `PriceBar`s.
//!
//! Column names are canonicalised first (lower case, spaces become
//! underscores), then the return price column is resolved: `adj_close` if
//! present, otherwise `close` renamed to `adj_close`. Only after that are rows
//! read into the strongly typed representation the rest of the crate uses.

use crate::error::{AnalyticsError, SchemaError};
use chrono::NaiveDate;
use configuration::WindowConfig;
use core_types::PriceBar;
use polars::prelude::*;
use std::collections::HashSet;

pub const TICKER: &str = "ticker";
pub const NAME: &str = "name";
pub const CATEGORY: &str = "category";
pub const DATE: &str = "date";
pub const OPEN: &str = "open";
pub const HIGH: &str = "high";
pub const LOW: &str = "low";
pub const CLOSE: &str = "close";
pub const ADJ_CLOSE: &str = "adj_close";
pub const VOLUME: &str = "volume";

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Where the `adj_close` values of a normalized table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Adjusted,
    /// No adjusted column existed; `close` was renamed to `adj_close`.
    Close,
}

/// The typed result of normalization.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub bars: Vec<PriceBar>,
    pub price_source: PriceSource,
}

/// Lower-cases a column name and replaces spaces with underscores.
pub fn canonical_column_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Canonicalises the column names of `df` in place and resolves the price column.
///
/// No column other than `close` is ever renamed, and nothing is dropped.
pub fn normalize_columns(df: &mut DataFrame) -> Result<PriceSource, AnalyticsError> {
    let canonical: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| canonical_column_name(name))
        .collect();

    let mut seen = HashSet::with_capacity(canonical.len());
    for name in &canonical {
        if !seen.insert(name.as_str()) {
            return Err(SchemaError::DuplicateColumn(name.clone()).into());
        }
    }
    df.set_column_names(&canonical)?;

    if seen.contains(ADJ_CLOSE) {
        return Ok(PriceSource::Adjusted);
    }
    if seen.contains(CLOSE) {
        df.rename(CLOSE, ADJ_CLOSE)?;
        return Ok(PriceSource::Close);
    }
    Err(SchemaError::MissingPriceColumn {
        available: canonical,
    }
    .into())
}

/// Normalizes `df` and reads every row into a `PriceBar`.
///
/// `ticker`, `date` and the price column are mandatory. The descriptive and
/// OHLCV columns are read when present and left empty otherwise. When the
/// price was resolved from `close`, each bar's `close` mirrors its `adj_close`.
pub fn normalize(mut df: DataFrame) -> Result<NormalizedTable, AnalyticsError> {
    let price_source = normalize_columns(&mut df)?;
    let height = df.height();

    let tickers = key_strings(&df, TICKER)?;
    let dates = dates(&df)?;
    let names = optional_strings(&df, NAME)?;
    let categories = optional_strings(&df, CATEGORY)?;
    let open = optional_floats(&df, OPEN)?;
    let high = optional_floats(&df, HIGH)?;
    let low = optional_floats(&df, LOW)?;
    let adj_close = optional_floats(&df, ADJ_CLOSE)?;
    let close = match price_source {
        PriceSource::Adjusted => optional_floats(&df, CLOSE)?,
        PriceSource::Close => adj_close.clone(),
    };
    let volume = volumes(&df)?;

    let mut bars = Vec::with_capacity(height);
    for row in 0..height {
        bars.push(PriceBar {
            ticker: tickers[row].clone(),
            name: names[row].clone().unwrap_or_default(),
            category: categories[row].clone().unwrap_or_default(),
            date: dates[row],
            open: open[row],
            high: high[row],
            low: low[row],
            close: close[row],
            adj_close: adj_close[row],
            volume: volume[row],
        });
    }

    tracing::debug!("Normalized {} rows ({:?} prices)", bars.len(), price_source);
    Ok(NormalizedTable { bars, price_source })
}

fn required<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series, AnalyticsError> {
    df.column(name)
        .map_err(|_| AnalyticsError::from(SchemaError::MissingColumn(name.to_string())))
}

fn key_strings(df: &DataFrame, name: &str) -> Result<Vec<String>, AnalyticsError> {
    let series = required(df, name)?.cast(&DataType::String)?;
    series
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.map(str::to_string).ok_or_else(|| {
                AnalyticsError::from(SchemaError::NullKey {
                    column: name.to_string(),
                    row,
                })
            })
        })
        .collect()
}

fn optional_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, AnalyticsError> {
    let Ok(column) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let series = column.cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

fn optional_floats(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, AnalyticsError> {
    let Ok(column) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let series = column.cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect())
}

/// Volumes arrive as integers or floats depending on the writer; negative or
/// non-finite cells are treated as missing.
fn volumes(df: &DataFrame) -> Result<Vec<Option<u64>>, AnalyticsError> {
    Ok(optional_floats(df, VOLUME)?
        .into_iter()
        .map(|value| {
            value
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v.round() as u64)
        })
        .collect())
}

/// Reads the `date` column as calendar days.
///
/// Date and Datetime columns are truncated to the day; string columns must
/// start with an ISO `YYYY-MM-DD` date.
fn dates(df: &DataFrame) -> Result<Vec<NaiveDate>, AnalyticsError> {
    let column = required(df, DATE)?;
    match column.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let days = column.cast(&DataType::Date)?.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    let days = value.ok_or_else(|| null_date(row))?;
                    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE).ok_or_else(
                        || {
                            AnalyticsError::from(SchemaError::InvalidDate {
                                row,
                                value: days.to_string(),
                            })
                        },
                    )
                })
                .collect()
        }
        DataType::String => column
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                let value = value.ok_or_else(|| null_date(row))?;
                parse_iso_date(value).ok_or_else(|| {
                    AnalyticsError::from(SchemaError::InvalidDate {
                        row,
                        value: value.to_string(),
                    })
                })
            })
            .collect(),
        other => Err(SchemaError::UnsupportedType {
            column: DATE.to_string(),
            dtype: other.to_string(),
        }
        .into()),
    }
}

fn null_date(row: usize) -> AnalyticsError {
    SchemaError::NullKey {
        column: DATE.to_string(),
        row,
    }
    .into()
}

fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let day = value.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Names of the derived columns in the output table.
///
/// Suffixes follow the configured windows, so the defaults produce
/// `volatility_20d`, `rolling_mean_50`, `rolling_mean_200`, `sharpe_20d`,
/// `sortino_20d`, `beta_60d` and `alpha_60d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumns {
    pub daily_return: String,
    pub cumulative_return: String,
    pub volatility: String,
    pub rolling_mean_fast: String,
    pub rolling_mean_slow: String,
    pub cummax: String,
    pub drawdown: String,
    pub max_drawdown: String,
    pub sharpe: String,
    pub sortino: String,
    pub beta: String,
    pub alpha: String,
}

impl OutputColumns {
    pub fn for_windows(windows: &WindowConfig) -> Self {
        Self {
            daily_return: "daily_return".to_string(),
            cumulative_return: "cumulative_return".to_string(),
            volatility: format!("volatility_{}d", windows.volatility),
            rolling_mean_fast: format!("rolling_mean_{}", windows.fast_mean),
            rolling_mean_slow: format!("rolling_mean_{}", windows.slow_mean),
            cummax: "cummax".to_string(),
            drawdown: "drawdown".to_string(),
            max_drawdown: "max_drawdown".to_string(),
            sharpe: format!("sharpe_{}d", windows.volatility),
            sortino: format!("sortino_{}d", windows.volatility),
            beta: format!("beta_{}d", windows.beta),
            alpha: format!("alpha_{}d", windows.beta),
        }
    }
}

impl Default for OutputColumns {
    fn default() -> Self {
        Self::for_windows(&WindowConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame(price_column: Option<&str>) -> DataFrame {
        let mut columns = vec![
            Series::new("Ticker", &["ACME", "ACME"]),
            Series::new("Name", &["Acme Corp", "Acme Corp"]),
            Series::new("Category", &["stocks", "stocks"]),
            Series::new("Date", &["2024-01-02", "2024-01-03 00:00:00"]),
            Series::new("Open", &[1.0, 2.0]),
            Series::new("Volume", &[100i64, 200]),
        ];
        if let Some(name) = price_column {
            columns.push(Series::new(name, &[10.0, 11.0]));
        }
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn canonical_names_are_lower_snake() {
        assert_eq!(canonical_column_name("Adj Close"), "adj_close");
        assert_eq!(canonical_column_name("Ticker"), "ticker");
    }

    #[test]
    fn adjusted_column_is_preferred() {
        let mut df = raw_frame(Some("Adj Close"));
        df.with_column(Series::new("Close", &[9.0, 9.5])).unwrap();
        let table = normalize(df).unwrap();

        assert_eq!(table.price_source, PriceSource::Adjusted);
        assert_eq!(table.bars[0].adj_close, Some(10.0));
        assert_eq!(table.bars[0].close, Some(9.0));
    }

    #[test]
    fn close_only_table_synthesizes_adj_close() {
        let table = normalize(raw_frame(Some("Close"))).unwrap();

        assert_eq!(table.price_source, PriceSource::Close);
        for bar in &table.bars {
            assert_eq!(bar.adj_close, bar.close);
        }
        assert_eq!(table.bars[1].adj_close, Some(11.0));
        assert_eq!(table.bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(table.bars[1].volume, Some(200));
        assert_eq!(table.bars[0].name, "Acme Corp");
        assert!(table.bars[0].high.is_none());
    }

    #[test]
    fn missing_price_column_is_a_schema_error() {
        let err = normalize(raw_frame(None)).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Schema(SchemaError::MissingPriceColumn { .. })
        ));
    }

    #[test]
    fn normalization_keeps_other_columns() {
        let mut df = raw_frame(Some("Close"));
        normalize_columns(&mut df).unwrap();
        let names: Vec<&str> = df.get_column_names();
        assert_eq!(
            names,
            ["ticker", "name", "category", "date", "open", "volume", "adj_close"]
        );
    }

    #[test]
    fn colliding_names_are_rejected() {
        let df = DataFrame::new(vec![
            Series::new("Close", &[1.0]),
            Series::new("close", &[1.0]),
        ])
        .unwrap();
        let err = normalize(df).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Schema(SchemaError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn missing_ticker_is_a_schema_error() {
        let df = DataFrame::new(vec![
            Series::new("date", &["2024-01-02"]),
            Series::new("adj_close", &[1.0]),
        ])
        .unwrap();
        let err = normalize(df).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Schema(SchemaError::MissingColumn(ref c)) if c == "ticker"
        ));
    }

    #[test]
    fn bad_date_string_is_reported() {
        let df = DataFrame::new(vec![
            Series::new("ticker", &["ACME"]),
            Series::new("date", &["02/01/2024"]),
            Series::new("adj_close", &[1.0]),
        ])
        .unwrap();
        assert!(matches!(
            normalize(df).unwrap_err(),
            AnalyticsError::Schema(SchemaError::InvalidDate { row: 0, .. })
        ));
    }

    #[test]
    fn output_columns_follow_windows() {
        let columns = OutputColumns::default();
        assert_eq!(columns.volatility, "volatility_20d");
        assert_eq!(columns.rolling_mean_fast, "rolling_mean_50");
        assert_eq!(columns.rolling_mean_slow, "rolling_mean_200");
        assert_eq!(columns.sortino, "sortino_20d");
        assert_eq!(columns.alpha, "alpha_60d");
    }
}
