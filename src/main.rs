use analytics::{Aggregator, OutputColumns, RunSummary};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use configuration::{init_tracing, load_config, load_universe, Config, Overrides};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use storage::{merge_bars, plan_fetch, BarSource, FetchWindow, ParquetStore, TableSink};

/// The main entry point for the market enricher.
fn main() -> Result<()> {
    // A missing .env file is fine; the config file and defaults still apply.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let _guard = init_tracing(&config.logging).context("Failed to initialise logging")?;

    match cli.command {
        Commands::Enrich(args) => handle_enrich(config, args),
        Commands::PlanFetch(args) => handle_plan_fetch(config, args),
        Commands::Merge(args) => handle_merge(config, args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Enriches a table of daily price bars with return, risk and benchmark metrics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich the raw table and write the enriched table.
    Enrich(EnrichArgs),
    /// Show which date range each tracked ticker still needs.
    PlanFetch(PlanFetchArgs),
    /// Fold a newly downloaded table into the raw table.
    Merge(MergeArgs),
}

#[derive(Parser)]
struct EnrichArgs {
    #[command(flatten)]
    overrides: Overrides,

    /// Print the run summary as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct PlanFetchArgs {
    /// Reference date for the plan (format: YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(Parser)]
struct MergeArgs {
    /// Parquet table holding the newly downloaded bars.
    #[arg(long)]
    incoming: PathBuf,
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Loads, enriches and writes the configured tables.
fn handle_enrich(mut config: Config, args: EnrichArgs) -> Result<()> {
    config.apply(&args.overrides);
    let paths = &config.paths;

    let source = ParquetStore::new(&paths.raw_data);
    let bars = source
        .load_bars()
        .with_context(|| format!("Failed to load bars from {}", paths.raw_data.display()))?;
    tracing::info!("Loaded {} bars", bars.len());

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tickers")?
            .progress_chars("#>-"),
    );
    if args.json {
        progress.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let enrichment = Aggregator::new(config.enrichment.clone())
        .with_progress(progress.clone())
        .run(bars)
        .context("Enrichment failed")?;
    progress.finish_and_clear();

    let columns = OutputColumns::for_windows(&config.enrichment.windows);
    let sink = ParquetStore::new(&paths.enriched_data);
    let written = sink
        .write_enriched(&enrichment.rows, &columns)
        .with_context(|| format!("Failed to write {}", paths.enriched_data.display()))?;

    let summary = RunSummary::from_rows(
        &enrichment.rows,
        &config.enrichment.benchmark,
        enrichment.benchmark.is_some(),
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
        println!(
            "Wrote {} rows for {} tickers to {}",
            written,
            enrichment.tickers,
            paths.enriched_data.display()
        );
    }
    Ok(())
}

/// Prints one fetch window per universe entry.
fn handle_plan_fetch(config: Config, args: PlanFetchArgs) -> Result<()> {
    let universe = load_universe(&config.paths.universe).with_context(|| {
        format!("Failed to load universe from {}", config.paths.universe.display())
    })?;
    let existing = load_existing(&config.paths.raw_data)?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Ticker", "Name", "Category", "Fetch"]);
    for plan in plan_fetch(&universe, &existing, today, config.fetch.years_back) {
        let window = match plan.window {
            FetchWindow::Since { start, end } => format!("{start} .. {end}"),
            FetchWindow::UpToDate { last } => format!("up to date ({last})"),
        };
        table.add_row(vec![
            plan.instrument.symbol,
            plan.instrument.name,
            plan.instrument.category.to_string(),
            window,
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Appends the incoming bars to the raw table, skipping dates already stored.
fn handle_merge(config: Config, args: MergeArgs) -> Result<()> {
    let existing = load_existing(&config.paths.raw_data)?;
    let incoming = ParquetStore::new(&args.incoming)
        .load_bars()
        .with_context(|| format!("Failed to load bars from {}", args.incoming.display()))?;

    let before = existing.len();
    let merged = merge_bars(existing, incoming);
    let added = merged.len() - before;

    let store = ParquetStore::new(&config.paths.raw_data);
    store
        .write_bars(&merged)
        .with_context(|| format!("Failed to write {}", config.paths.raw_data.display()))?;
    println!(
        "Added {} new bars ({} total) to {}",
        added,
        merged.len(),
        config.paths.raw_data.display()
    );
    Ok(())
}

/// Reads the raw table, treating a file that does not exist yet as empty.
fn load_existing(path: &Path) -> Result<Vec<core_types::PriceBar>> {
    let store = ParquetStore::new(path);
    if !store.exists() {
        tracing::info!("No raw table at {}, starting empty", path.display());
        return Ok(Vec::new());
    }
    store
        .load_bars()
        .with_context(|| format!("Failed to load bars from {}", path.display()))
}

fn print_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Ticker", "Date", "Rows", "Adj Close", "Cum. Return", "Vol", "Max DD", "Sharpe",
        "Sortino", "Beta", "Alpha",
    ]);
    for snapshot in &summary.latest {
        table.add_row(vec![
            snapshot.ticker.clone(),
            snapshot.date.to_string(),
            snapshot.rows.to_string(),
            fmt_metric(snapshot.adj_close),
            fmt_metric(snapshot.cumulative_return),
            fmt_metric(snapshot.volatility),
            fmt_metric(snapshot.max_drawdown),
            fmt_metric(snapshot.sharpe),
            fmt_metric(snapshot.sortino),
            fmt_metric(snapshot.beta),
            fmt_metric(snapshot.alpha),
        ]);
    }
    println!("{table}");

    if !summary.benchmark_found {
        println!(
            "Benchmark {} not found in input; beta and alpha are empty.",
            summary.benchmark
        );
    }
}

fn fmt_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}
