use crate::benchmark::BenchmarkReturns;
use crate::error::AnalyticsError;
use crate::rolling::{defined, RollingPair, RollingWindow};
use configuration::WindowConfig;
use core_types::{EnrichedRow, InstrumentSeries, Metrics};

/// Derives every per-bar metric for one instrument.
///
/// The enricher holds no mutable state between calls; each call builds its
/// own rolling windows, so one instance can be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct Enricher<'a> {
    windows: WindowConfig,
    benchmark: Option<&'a BenchmarkReturns>,
}

impl<'a> Enricher<'a> {
    /// Fails when `windows` does not pass `WindowConfig::validate`.
    pub fn new(
        windows: WindowConfig,
        benchmark: Option<&'a BenchmarkReturns>,
    ) -> Result<Self, AnalyticsError> {
        windows.validate()?;
        Ok(Self { windows, benchmark })
    }

    /// Enriches one instrument's bars.
    ///
    /// Bars are stable-sorted by date first. The output has the same length as
    /// the input and is in ascending date order.
    pub fn enrich(&self, series: InstrumentSeries) -> Vec<EnrichedRow> {
        let mut bars = series.bars;
        bars.sort_by_key(|bar| bar.date);

        let mut state = SeriesState::new(&self.windows);
        let mut rows = Vec::with_capacity(bars.len());
        let mut previous_price: Option<f64> = None;

        for (position, bar) in bars.into_iter().enumerate() {
            let price = bar.adj_close;
            let daily_return = if position == 0 {
                None
            } else {
                match (previous_price, price) {
                    (Some(previous), Some(current)) => defined(current / previous - 1.0),
                    _ => None,
                }
            };
            previous_price = price;

            let benchmark_return = self.benchmark.and_then(|b| b.get(bar.date));
            let metrics = state.step(price, daily_return, benchmark_return, self.benchmark.is_some());
            rows.push(EnrichedRow { bar, metrics });
        }

        rows
    }
}

/// Running state for one pass over a series.
struct SeriesState {
    compounded: f64,
    peak: Option<f64>,
    trough: Option<f64>,
    returns: RollingWindow,
    downside: RollingWindow,
    fast_mean: RollingWindow,
    slow_mean: RollingWindow,
    market: RollingPair,
}

impl SeriesState {
    fn new(windows: &WindowConfig) -> Self {
        Self {
            compounded: 1.0,
            peak: None,
            trough: None,
            returns: RollingWindow::new(windows.volatility),
            downside: RollingWindow::new(windows.volatility),
            fast_mean: RollingWindow::new(windows.fast_mean),
            slow_mean: RollingWindow::new(windows.slow_mean),
            market: RollingPair::new(windows.beta),
        }
    }

    fn step(
        &mut self,
        price: Option<f64>,
        daily_return: Option<f64>,
        benchmark_return: Option<f64>,
        has_benchmark: bool,
    ) -> Metrics {
        // Undefined returns are skipped, not treated as a reset of the product.
        let cumulative_return = daily_return.and_then(|r| {
            self.compounded *= 1.0 + r;
            defined(self.compounded)
        });

        let cummax = cumulative_return.map(|c| {
            let peak = self.peak.map_or(c, |p| p.max(c));
            self.peak = Some(peak);
            peak
        });
        let drawdown = cumulative_return
            .zip(cummax)
            .and_then(|(c, peak)| defined(c / peak - 1.0));
        let max_drawdown = drawdown.map(|d| {
            let trough = self.trough.map_or(d, |t| t.min(d));
            self.trough = Some(trough);
            trough
        });

        self.returns.push(daily_return);
        self.downside.push(daily_return.filter(|r| *r < 0.0));
        self.fast_mean.push(price);
        self.slow_mean.push(price);

        let mean_return = self.returns.mean();
        let volatility = self.returns.sample_std();
        let sharpe = ratio(mean_return, volatility);
        let sortino = ratio(mean_return, self.downside.sample_std());

        let (beta, alpha) = if has_benchmark {
            self.market.push(daily_return, benchmark_return);
            let beta = ratio(self.market.covariance(), self.market.variance_y());
            let alpha = beta
                .zip(self.market.means())
                .and_then(|(beta, (mean_x, mean_y))| defined(mean_x - beta * mean_y));
            (beta, alpha)
        } else {
            (None, None)
        };

        Metrics {
            daily_return,
            cumulative_return,
            volatility,
            rolling_mean_fast: self.fast_mean.mean(),
            rolling_mean_slow: self.slow_mean.mean(),
            cummax,
            drawdown,
            max_drawdown,
            sharpe,
            sortino,
            beta,
            alpha,
        }
    }
}

/// IEEE division of two defined values: `x/0` is a signed infinity, `0/0` undefined.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    numerator
        .zip(denominator)
        .and_then(|(n, d)| defined(n / d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use core_types::PriceBar;

    fn series(ticker: &str, prices: &[f64]) -> InstrumentSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, p)| {
                PriceBar::from_adj_close(ticker, start + Days::new(i as u64), *p)
            })
            .collect();
        InstrumentSeries::new(ticker, bars).unwrap()
    }

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("value should be defined");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn acme_example_without_benchmark() {
        let enricher = Enricher::new(WindowConfig::default(), None).unwrap();
        let rows = enricher.enrich(series("ACME", &[100.0, 102.0, 101.0, 105.0, 98.0]));

        assert_eq!(rows.len(), 5);
        assert!(rows[0].metrics.daily_return.is_none());
        approx(rows[1].metrics.daily_return, 0.02);
        approx(rows[2].metrics.daily_return, 101.0 / 102.0 - 1.0);
        approx(rows[3].metrics.daily_return, 105.0 / 101.0 - 1.0);
        approx(rows[4].metrics.daily_return, 98.0 / 105.0 - 1.0);

        assert!(rows[0].metrics.cumulative_return.is_none());
        approx(rows[4].metrics.cumulative_return, 0.98);

        for row in &rows {
            assert!(row.metrics.beta.is_none());
            assert!(row.metrics.alpha.is_none());
            assert!(row.metrics.volatility.is_none());
            assert!(row.metrics.rolling_mean_fast.is_none());
        }
    }

    #[test]
    fn drawdown_tracks_peak() {
        let enricher = Enricher::new(WindowConfig::default(), None).unwrap();
        let rows = enricher.enrich(series("ACME", &[100.0, 110.0, 99.0, 104.5, 120.0]));

        approx(rows[1].metrics.cummax, 1.1);
        approx(rows[2].metrics.cummax, 1.1);
        approx(rows[2].metrics.drawdown, 0.99 / 1.1 - 1.0);
        approx(rows[3].metrics.max_drawdown, 0.99 / 1.1 - 1.0);
        approx(rows[4].metrics.drawdown, 0.0);
        approx(rows[4].metrics.max_drawdown, 0.99 / 1.1 - 1.0);
    }

    #[test]
    fn unsorted_input_is_sorted_by_date() {
        let enricher = Enricher::new(WindowConfig::default(), None).unwrap();
        let mut input = series("ACME", &[100.0, 102.0, 101.0]);
        input.bars.reverse();
        let rows = enricher.enrich(input);

        let dates: Vec<_> = rows.iter().map(|r| r.bar.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        approx(rows[1].metrics.daily_return, 0.02);
    }

    #[test]
    fn moving_average_needs_full_window() {
        let windows = WindowConfig {
            fast_mean: 3,
            slow_mean: 4,
            ..WindowConfig::default()
        };
        let enricher = Enricher::new(windows, None).unwrap();
        let rows = enricher.enrich(series("ACME", &[1.0, 2.0, 3.0, 4.0, 5.0]));

        assert!(rows[1].metrics.rolling_mean_fast.is_none());
        approx(rows[2].metrics.rolling_mean_fast, 2.0);
        approx(rows[4].metrics.rolling_mean_fast, 4.0);
        assert!(rows[2].metrics.rolling_mean_slow.is_none());
        approx(rows[3].metrics.rolling_mean_slow, 2.5);
    }

    #[test]
    fn volatility_waits_for_defined_returns() {
        let windows = WindowConfig {
            volatility: 3,
            ..WindowConfig::default()
        };
        let enricher = Enricher::new(windows, None).unwrap();
        let rows = enricher.enrich(series("ACME", &[100.0, 101.0, 99.0, 102.0, 103.0]));

        // Row 0 has no return, so the first full window of returns ends at row 3.
        assert!(rows[2].metrics.volatility.is_none());
        assert!(rows[3].metrics.volatility.is_some());
        assert!(rows[3].metrics.sharpe.is_some());
    }

    #[test]
    fn zero_volatility_gives_infinite_sharpe() {
        let windows = WindowConfig {
            volatility: 3,
            ..WindowConfig::default()
        };
        let enricher = Enricher::new(windows, None).unwrap();
        // Doubling every day: every return is exactly 1.0.
        let rows = enricher.enrich(series("ACME", &[1.0, 2.0, 4.0, 8.0, 16.0]));

        assert_eq!(rows[3].metrics.volatility, Some(0.0));
        assert_eq!(rows[3].metrics.sharpe, Some(f64::INFINITY));
    }

    #[test]
    fn flat_prices_give_undefined_sharpe() {
        let windows = WindowConfig {
            volatility: 3,
            ..WindowConfig::default()
        };
        let enricher = Enricher::new(windows, None).unwrap();
        let rows = enricher.enrich(series("ACME", &[5.0; 6]));

        assert_eq!(rows[5].metrics.volatility, Some(0.0));
        assert!(rows[5].metrics.sharpe.is_none());
    }

    #[test]
    fn sortino_requires_a_full_window_of_losses() {
        let windows = WindowConfig {
            volatility: 3,
            ..WindowConfig::default()
        };
        let enricher = Enricher::new(windows, None).unwrap();
        let rows = enricher.enrich(series("ACME", &[100.0, 99.0, 97.0, 94.0, 95.0, 90.0]));

        assert!(rows[2].metrics.sortino.is_none());
        let mean = rows[3].metrics.sharpe.unwrap() * rows[3].metrics.volatility.unwrap();
        assert!(mean < 0.0);
        assert!(rows[3].metrics.sortino.unwrap() < 0.0);
        // The gain on row 4 is excluded from the downside series.
        assert!(rows[4].metrics.sortino.is_none());
        assert!(rows[5].metrics.sortino.is_none());
    }

    #[test]
    fn undefined_price_does_not_reset_compounding() {
        let enricher = Enricher::new(WindowConfig::default(), None).unwrap();
        let mut input = series("ACME", &[100.0, 110.0, 0.0, 121.0, 133.1]);
        input.bars[2].adj_close = None;
        let rows = enricher.enrich(input);

        approx(rows[1].metrics.cumulative_return, 1.1);
        assert!(rows[2].metrics.cumulative_return.is_none());
        assert!(rows[3].metrics.cumulative_return.is_none());
        approx(rows[4].metrics.cumulative_return, 1.1 * 1.1);
    }

    #[test]
    fn zero_window_is_an_error() {
        let windows = WindowConfig {
            beta: 0,
            ..WindowConfig::default()
        };
        let err = Enricher::new(windows, None).unwrap_err();
        assert!(matches!(err, AnalyticsError::Config(_)));
    }

    #[test]
    fn absent_benchmark_leaves_beta_undefined() {
        let windows = WindowConfig {
            beta: 2,
            ..WindowConfig::default()
        };
        let enricher = Enricher::new(windows, None).unwrap();
        let rows = enricher.enrich(series("ACME", &[1.0, 2.0, 3.0, 5.0, 8.0]));
        assert!(rows.iter().all(|r| r.metrics.beta.is_none() && r.metrics.alpha.is_none()));
    }
}
