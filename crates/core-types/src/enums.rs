use serde::{Deserialize, Serialize};
use std::fmt;

/// The buckets a ticker universe is organised into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Stocks,
    Indices,
    Cryptos,
}

impl AssetCategory {
    /// The tag written into the `category` column of a price table.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Stocks => "stocks",
            AssetCategory::Indices => "indices",
            AssetCategory::Cryptos => "cryptos",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
