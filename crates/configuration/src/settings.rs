use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub enrichment: EnrichmentConfig,
    pub paths: PathsConfig,
    pub fetch: FetchConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Checks every section that has constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.enrichment.validate()
    }

    /// Applies command-line overrides on top of the loaded values.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(benchmark) = &overrides.benchmark {
            self.enrichment.benchmark = benchmark.clone();
        }
        if let Some(input) = &overrides.input {
            self.paths.raw_data = input.clone();
        }
        if let Some(output) = &overrides.output {
            self.paths.enriched_data = output.clone();
        }
    }
}

/// Parameters of the enrichment run itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// The ticker whose returns beta and alpha are measured against (e.g., "^GSPC").
    pub benchmark: String,
    pub windows: WindowConfig,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            benchmark: "^GSPC".to_string(),
            windows: WindowConfig::default(),
        }
    }
}

impl EnrichmentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.benchmark.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "enrichment.benchmark must not be empty".to_string(),
            ));
        }
        self.windows.validate()
    }
}

/// Rolling window lengths, counted in observations (trading days).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window for volatility and the Sharpe/Sortino ratios.
    pub volatility: usize,
    /// Short trend moving average.
    pub fast_mean: usize,
    /// Long trend moving average.
    pub slow_mean: usize,
    /// Window for beta and alpha against the benchmark.
    pub beta: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            volatility: 20,
            fast_mean: 50,
            slow_mean: 200,
            beta: 60,
        }
    }
}

impl WindowConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("volatility", self.volatility),
            ("fast_mean", self.fast_mean),
            ("slow_mean", self.slow_mean),
            ("beta", self.beta),
        ];
        for (name, length) in windows {
            if length == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "enrichment.windows.{name} must be at least 1"
                )));
            }
        }
        if self.fast_mean == self.slow_mean {
            return Err(ConfigError::ValidationError(format!(
                "enrichment.windows.fast_mean and slow_mean must differ (both {})",
                self.fast_mean
            )));
        }
        Ok(())
    }
}

/// Where tables and the ticker universe live on disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Raw daily bars written by the fetcher.
    pub raw_data: PathBuf,
    /// Destination of the enriched table.
    pub enriched_data: PathBuf,
    /// TOML file listing the tracked tickers.
    pub universe: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_data: PathBuf::from("data/parquet/daily_data.parquet"),
            enriched_data: PathBuf::from("data/processed/portfolio_enriched.parquet"),
            universe: PathBuf::from("config/tickers.toml"),
        }
    }
}

/// Incremental download bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// How much history a ticker with no stored bars starts from.
    pub years_back: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { years_back: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data/logs"),
            file_prefix: "enricher.log".to_string(),
            level: "info".to_string(),
        }
    }
}

/// Values that can be overridden from the command line.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct Overrides {
    /// Benchmark ticker for beta/alpha (e.g., "^GSPC").
    #[cfg_attr(feature = "clap", arg(long))]
    pub benchmark: Option<String>,

    /// Path to the raw Parquet table.
    #[cfg_attr(feature = "clap", arg(long))]
    pub input: Option<PathBuf>,

    /// Path the enriched Parquet table is written to.
    #[cfg_attr(feature = "clap", arg(long))]
    pub output: Option<PathBuf>,
}
