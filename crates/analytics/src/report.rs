use chrono::NaiveDate;
use core_types::EnrichedRow;
use serde::Serialize;

/// The latest enriched values of one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentSnapshot {
    pub ticker: String,
    pub name: String,
    pub date: NaiveDate,
    pub rows: usize,
    pub adj_close: Option<f64>,
    pub cumulative_return: Option<f64>,
    pub volatility: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub beta: Option<f64>,
    pub alpha: Option<f64>,
}

/// What a run produced, for the console and for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub tickers: usize,
    pub rows: usize,
    pub benchmark: String,
    pub benchmark_found: bool,
    pub latest: Vec<InstrumentSnapshot>,
}

impl RunSummary {
    /// Builds a summary from rows grouped by ticker in ascending date order,
    /// as the `Aggregator` produces them.
    pub fn from_rows(rows: &[EnrichedRow], benchmark: &str, benchmark_found: bool) -> Self {
        let latest: Vec<InstrumentSnapshot> = rows
            .chunk_by(|a, b| a.bar.ticker == b.bar.ticker)
            .filter_map(|group| {
                let last = group.last()?;
                Some(InstrumentSnapshot {
                    ticker: last.bar.ticker.clone(),
                    name: last.bar.name.clone(),
                    date: last.bar.date,
                    rows: group.len(),
                    adj_close: last.bar.adj_close,
                    cumulative_return: last.metrics.cumulative_return,
                    volatility: last.metrics.volatility,
                    max_drawdown: last.metrics.max_drawdown,
                    sharpe: last.metrics.sharpe,
                    sortino: last.metrics.sortino,
                    beta: last.metrics.beta,
                    alpha: last.metrics.alpha,
                })
            })
            .collect();

        Self {
            tickers: latest.len(),
            rows: rows.len(),
            benchmark: benchmark.to_string(),
            benchmark_found,
            latest,
        }
    }
}
