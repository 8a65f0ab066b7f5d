use crate::error::ConfigError;
use core_types::AssetCategory;
use serde::Deserialize;
use std::path::Path;

/// One tracked ticker from the universe file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub symbol: String,
    pub name: String,
    pub category: AssetCategory,
}

#[derive(Debug, Deserialize)]
struct UniverseEntry {
    ticker: String,
    name: Option<String>,
}

/// On-disk layout: one array of tables per category.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UniverseFile {
    stocks: Vec<UniverseEntry>,
    indices: Vec<UniverseEntry>,
    cryptos: Vec<UniverseEntry>,
}

impl UniverseFile {
    fn into_sections(self) -> [(AssetCategory, Vec<UniverseEntry>); 3] {
        [
            (AssetCategory::Stocks, self.stocks),
            (AssetCategory::Indices, self.indices),
            (AssetCategory::Cryptos, self.cryptos),
        ]
    }
}

/// Loads the ticker universe from a TOML file.
///
/// Instruments come back grouped by category (stocks, indices, cryptos), each
/// group in file order. A missing `name` falls back to the ticker itself.
pub fn load_universe(path: &Path) -> Result<Vec<Instrument>, ConfigError> {
    let raw = config::Config::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Toml))
        .build()?;
    let file = raw.try_deserialize::<UniverseFile>()?;

    let mut instruments = Vec::new();
    for (category, entries) in file.into_sections() {
        for entry in entries {
            let symbol = entry.ticker.trim().to_string();
            if symbol.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "empty ticker in the '{category}' section of {}",
                    path.display()
                )));
            }
            let name = entry.name.unwrap_or_else(|| symbol.clone());
            instruments.push(Instrument {
                symbol,
                name,
                category,
            });
        }
    }

    tracing::info!(
        "Loaded {} instruments from {}",
        instruments.len(),
        path.display()
    );
    Ok(instruments)
}
