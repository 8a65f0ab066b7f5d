use crate::rolling::defined;
use chrono::NaiveDate;
use core_types::PriceBar;
use std::collections::BTreeMap;

/// Daily simple returns of the benchmark instrument, keyed by trade date.
///
/// Built once per run and then only read, so it can be shared by reference
/// across every enrichment task.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReturns {
    ticker: String,
    returns: BTreeMap<NaiveDate, f64>,
}

impl BenchmarkReturns {
    /// Computes `price[i] / price[i-1] - 1` over the bars in date order.
    ///
    /// The first bar, and any bar whose own or preceding `adj_close` is
    /// missing, has no return and is simply absent from the map.
    pub fn from_bars(ticker: &str, bars: &[&PriceBar]) -> Self {
        let mut ordered: Vec<&PriceBar> = bars.to_vec();
        ordered.sort_by_key(|bar| bar.date);

        let mut returns = BTreeMap::new();
        for pair in ordered.windows(2) {
            if let (Some(previous), Some(current)) = (pair[0].adj_close, pair[1].adj_close) {
                if let Some(r) = defined(current / previous - 1.0) {
                    returns.insert(pair[1].date, r);
                }
            }
        }

        Self {
            ticker: ticker.to_string(),
            returns,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// The benchmark return on `date`, if the benchmark traded and had a prior close.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.returns.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Isolates the benchmark's bars and derives its return series.
///
/// Returns `None` when no bar carries the benchmark ticker. That is a degraded
/// run rather than a failure: beta and alpha just stay undefined.
pub fn extract_benchmark(bars: &[PriceBar], benchmark: &str) -> Option<BenchmarkReturns> {
    let matching: Vec<&PriceBar> = bars.iter().filter(|bar| bar.ticker == benchmark).collect();
    if matching.is_empty() {
        tracing::warn!(
            "Benchmark {} not found in the input; beta and alpha will be undefined",
            benchmark
        );
        return None;
    }

    let series = BenchmarkReturns::from_bars(benchmark, &matching);
    tracing::info!(
        "Benchmark {}: {} bars, {} daily returns",
        benchmark,
        matching.len(),
        series.len()
    );
    Some(series)
}
