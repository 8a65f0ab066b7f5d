use crate::benchmark::{extract_benchmark, BenchmarkReturns};
use crate::enricher::Enricher;
use crate::error::AnalyticsError;
use configuration::EnrichmentConfig;
use core_types::{EnrichedRow, InstrumentSeries, PriceBar};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// The enriched rows of a run plus what the benchmark lookup found.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub rows: Vec<EnrichedRow>,
    pub benchmark: Option<BenchmarkReturns>,
    pub tickers: usize,
}

/// Fans a table out by ticker, enriches every instrument, and merges the results.
///
/// Output order is deterministic: tickers ascending by identifier, and within a
/// ticker ascending by date. The input is assumed to be free of duplicate
/// `(ticker, date)` pairs.
pub struct Aggregator {
    config: EnrichmentConfig,
    progress: Option<ProgressBar>,
}

impl Aggregator {
    pub fn new(config: EnrichmentConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Ticks `progress` once per enriched instrument.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn run(&self, bars: Vec<PriceBar>) -> Result<Enrichment, AnalyticsError> {
        self.config.validate()?;

        let benchmark = extract_benchmark(&bars, &self.config.benchmark);
        let partitions = partition(bars);
        let tickers = partitions.len();
        tracing::info!(
            "Enriching {} tickers against benchmark {}",
            tickers,
            self.config.benchmark
        );

        if let Some(progress) = &self.progress {
            progress.set_length(tickers as u64);
        }

        let enricher = Enricher::new(self.config.windows, benchmark.as_ref())?;
        // Indexed collect keeps partition order whatever order the workers finish in.
        let enriched: Vec<(String, Vec<EnrichedRow>)> = partitions
            .into_par_iter()
            .map(|series| {
                let ticker = series.ticker.clone();
                let rows = enricher.enrich(series);
                tracing::debug!("Enriched {} ({} rows)", ticker, rows.len());
                if let Some(progress) = &self.progress {
                    progress.inc(1);
                }
                (ticker, rows)
            })
            .collect();

        let rows: Vec<EnrichedRow> = enriched
            .into_iter()
            .flat_map(|(_, rows)| rows)
            .collect();

        if let Some(progress) = &self.progress {
            progress.finish_with_message("Enrichment complete");
        }

        Ok(Enrichment {
            rows,
            benchmark,
            tickers,
        })
    }
}

/// Groups bars by ticker, ascending by ticker identifier.
///
/// Bars keep their input order inside a group; the enricher sorts them.
pub fn partition(bars: Vec<PriceBar>) -> Vec<InstrumentSeries> {
    let mut groups: BTreeMap<String, Vec<PriceBar>> = BTreeMap::new();
    for bar in bars {
        groups.entry(bar.ticker.clone()).or_default().push(bar);
    }
    groups
        .into_iter()
        .map(|(ticker, bars)| InstrumentSeries { ticker, bars })
        .collect()
}
