use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;
pub mod universe;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_tracing;
pub use settings::{
    Config, EnrichmentConfig, FetchConfig, LoggingConfig, Overrides, PathsConfig, WindowConfig,
};
pub use universe::{load_universe, Instrument};

/// Prefix for environment overrides, e.g. `ENRICHER__ENRICHMENT__BENCHMARK`.
pub const ENV_PREFIX: &str = "ENRICHER";

/// Loads the application configuration.
///
/// When `path` is given the file must exist. Otherwise an optional
/// `config.toml` in the working directory is read. Environment variables with
/// the `ENRICHER` prefix are layered on top, and any section left out falls
/// back to its defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).format(config::FileFormat::Toml),
        None => config::File::with_name("config.toml")
            .format(config::FileFormat::Toml)
            .required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
