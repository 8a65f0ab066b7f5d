use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily bar for one instrument.
///
/// Price and volume cells are optional because upstream tables may carry
/// nulls. A `None` here is a missing observation, never a zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub ticker: String,
    pub name: String,
    pub category: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    /// Dividend/split-adjusted close. This is the price every return is computed from.
    pub adj_close: Option<f64>,
    pub volume: Option<u64>,
}

impl PriceBar {
    /// Builds a bar that only carries the fields the analytics need.
    ///
    /// `close` mirrors `adj_close`, matching what a table without an adjusted
    /// column looks like after normalization.
    pub fn from_adj_close(ticker: &str, date: NaiveDate, adj_close: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            category: String::new(),
            date,
            open: None,
            high: None,
            low: None,
            close: Some(adj_close),
            adj_close: Some(adj_close),
            volume: None,
        }
    }
}

/// All bars for one ticker, ascending by date.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSeries {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
}

impl InstrumentSeries {
    /// Groups `bars` under `ticker`, rejecting bars that belong to another instrument.
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, CoreError> {
        let ticker = ticker.into();
        if let Some(stray) = bars.iter().find(|b| b.ticker != ticker) {
            return Err(CoreError::InvalidInput(
                "InstrumentSeries".to_string(),
                format!("bar for '{}' in series '{}'", stray.ticker, ticker),
            ));
        }
        Ok(Self { ticker, bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Every metric derived for a single bar. `None` means undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub daily_return: Option<f64>,
    pub cumulative_return: Option<f64>,
    pub volatility: Option<f64>,
    pub rolling_mean_fast: Option<f64>,
    pub rolling_mean_slow: Option<f64>,
    pub cummax: Option<f64>,
    pub drawdown: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub beta: Option<f64>,
    pub alpha: Option<f64>,
}

/// A bar together with the metrics computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRow {
    pub bar: PriceBar,
    pub metrics: Metrics,
}
