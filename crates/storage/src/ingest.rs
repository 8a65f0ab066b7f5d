//! Bookkeeping for incremental downloads of daily bars.
//!
//! Fetching itself happens elsewhere. This module decides which date range
//! each tracked ticker still needs and folds newly fetched bars into the
//! stored table without duplicating `(ticker, date)` pairs.

use chrono::{Days, NaiveDate};
use configuration::Instrument;
use core_types::PriceBar;
use std::collections::{HashMap, HashSet};

/// The date range still missing for one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchWindow {
    /// Download everything from `start` through `end`, inclusive.
    Since { start: NaiveDate, end: NaiveDate },
    /// Stored bars already reach `last`, which is today or later.
    UpToDate { last: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub instrument: Instrument,
    pub window: FetchWindow,
}

/// Plans one fetch per universe entry.
///
/// A ticker with stored bars resumes the day after its latest stored date. A
/// ticker with none starts `years_back * 365` days before `today`.
pub fn plan_fetch(
    universe: &[Instrument],
    existing: &[PriceBar],
    today: NaiveDate,
    years_back: u32,
) -> Vec<FetchPlan> {
    let mut latest: HashMap<&str, NaiveDate> = HashMap::new();
    for bar in existing {
        latest
            .entry(bar.ticker.as_str())
            .and_modify(|d| *d = (*d).max(bar.date))
            .or_insert(bar.date);
    }

    let default_start = today
        .checked_sub_days(Days::new(u64::from(years_back) * 365))
        .unwrap_or(NaiveDate::MIN);

    universe
        .iter()
        .map(|instrument| {
            let window = match latest.get(instrument.symbol.as_str()) {
                Some(&last) => match last.checked_add_days(Days::new(1)) {
                    Some(start) if start <= today => FetchWindow::Since { start, end: today },
                    _ => FetchWindow::UpToDate { last },
                },
                None => FetchWindow::Since {
                    start: default_start,
                    end: today,
                },
            };
            FetchPlan {
                instrument: instrument.clone(),
                window,
            }
        })
        .collect()
}

/// Appends `incoming` to `existing`, dropping any bar whose `(ticker, date)`
/// is already present. The first occurrence wins.
pub fn merge_bars(existing: Vec<PriceBar>, incoming: Vec<PriceBar>) -> Vec<PriceBar> {
    let total = existing.len() + incoming.len();
    let mut seen: HashSet<(String, NaiveDate)> = HashSet::with_capacity(total);
    let merged: Vec<PriceBar> = existing
        .into_iter()
        .chain(incoming)
        .filter(|bar| seen.insert((bar.ticker.clone(), bar.date)))
        .collect();

    tracing::debug!(
        "Merged {} bars, dropped {} duplicates",
        merged.len(),
        total - merged.len()
    );
    merged
}
