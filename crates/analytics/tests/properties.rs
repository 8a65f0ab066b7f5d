use analytics::Enricher;
use chrono::{Days, NaiveDate};
use configuration::WindowConfig;
use core_types::{InstrumentSeries, PriceBar};
use proptest::prelude::*;

fn series_from(prices: &[f64]) -> InstrumentSeries {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let bars = prices
        .iter()
        .enumerate()
        .map(|(i, p)| PriceBar::from_adj_close("PROP", start + Days::new(i as u64), *p))
        .collect();
    InstrumentSeries::new("PROP", bars).unwrap()
}

fn small_windows() -> WindowConfig {
    WindowConfig {
        volatility: 5,
        fast_mean: 3,
        slow_mean: 8,
        beta: 6,
    }
}

proptest! {
    #[test]
    fn drawdown_is_never_positive(prices in prop::collection::vec(1.0f64..1_000.0, 1..120)) {
        let rows = Enricher::new(small_windows(), None).unwrap().enrich(series_from(&prices));
        for row in &rows {
            if row.metrics.cumulative_return.is_some() {
                let drawdown = row.metrics.drawdown.expect("drawdown defined with cumulative return");
                prop_assert!(drawdown <= 0.0);
            }
        }
    }

    #[test]
    fn max_drawdown_never_increases(prices in prop::collection::vec(1.0f64..1_000.0, 1..120)) {
        let rows = Enricher::new(small_windows(), None).unwrap().enrich(series_from(&prices));
        let worst: Vec<f64> = rows.iter().filter_map(|r| r.metrics.max_drawdown).collect();
        for pair in worst.windows(2) {
            prop_assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn output_matches_input_length(prices in prop::collection::vec(1.0f64..1_000.0, 0..60)) {
        let rows = Enricher::new(small_windows(), None).unwrap().enrich(series_from(&prices));
        prop_assert_eq!(rows.len(), prices.len());
    }

    #[test]
    fn fast_mean_is_undefined_until_window_fills(prices in prop::collection::vec(1.0f64..1_000.0, 1..40)) {
        let windows = small_windows();
        let rows = Enricher::new(windows, None).unwrap().enrich(series_from(&prices));
        for (i, row) in rows.iter().enumerate() {
            prop_assert_eq!(row.metrics.rolling_mean_fast.is_some(), i + 1 >= windows.fast_mean);
        }
    }
}
