use analytics::schema::{
    ADJ_CLOSE, CATEGORY, CLOSE, DATE, HIGH, LOW, NAME, OPEN, TICKER, VOLUME,
};
use analytics::OutputColumns;
use chrono::NaiveDate;
use core_types::{EnrichedRow, Metrics, PriceBar};
use polars::prelude::*;

/// The ten input columns, in the order they are written.
fn bar_columns<'a>(bars: impl Iterator<Item = &'a PriceBar> + Clone) -> Vec<Series> {
    let strings = |name: &str, field: fn(&PriceBar) -> &str| {
        let values: Vec<&str> = bars.clone().map(field).collect();
        Series::new(name, values)
    };
    let floats = |name: &str, field: fn(&PriceBar) -> Option<f64>| {
        let values: Vec<Option<f64>> = bars.clone().map(field).collect();
        Series::new(name, values)
    };

    let dates: Vec<NaiveDate> = bars.clone().map(|b| b.date).collect();
    let volumes: Vec<Option<u64>> = bars.clone().map(|b| b.volume).collect();

    vec![
        strings(TICKER, |b| b.ticker.as_str()),
        strings(NAME, |b| b.name.as_str()),
        strings(CATEGORY, |b| b.category.as_str()),
        Series::new(DATE, dates),
        floats(OPEN, |b| b.open),
        floats(HIGH, |b| b.high),
        floats(LOW, |b| b.low),
        floats(CLOSE, |b| b.close),
        floats(ADJ_CLOSE, |b| b.adj_close),
        Series::new(VOLUME, volumes),
    ]
}

/// Builds the raw bar table in normalized column layout.
pub fn bars_to_frame(bars: &[PriceBar]) -> PolarsResult<DataFrame> {
    DataFrame::new(bar_columns(bars.iter()))
}

/// Builds the enriched output table: every input column followed by the metrics.
///
/// Undefined metrics become nulls.
pub fn enriched_to_frame(rows: &[EnrichedRow], columns: &OutputColumns) -> PolarsResult<DataFrame> {
    let metric = |name: &str, field: fn(&Metrics) -> Option<f64>| {
        let values: Vec<Option<f64>> = rows.iter().map(|r| field(&r.metrics)).collect();
        Series::new(name, values)
    };

    let mut series = bar_columns(rows.iter().map(|r| &r.bar));
    series.extend([
        metric(&columns.daily_return, |m| m.daily_return),
        metric(&columns.cumulative_return, |m| m.cumulative_return),
        metric(&columns.volatility, |m| m.volatility),
        metric(&columns.rolling_mean_fast, |m| m.rolling_mean_fast),
        metric(&columns.rolling_mean_slow, |m| m.rolling_mean_slow),
        metric(&columns.cummax, |m| m.cummax),
        metric(&columns.drawdown, |m| m.drawdown),
        metric(&columns.max_drawdown, |m| m.max_drawdown),
        metric(&columns.sharpe, |m| m.sharpe),
        metric(&columns.sortino, |m| m.sortino),
        metric(&columns.beta, |m| m.beta),
        metric(&columns.alpha, |m| m.alpha),
    ]);
    DataFrame::new(series)
}
