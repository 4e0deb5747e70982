//! Loader for the JSON assets bundled with the crate.
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::DataLoader;
use crate::battle::config::DEFAULT_BATTLE_DATA;
use crate::battle::drops::DEFAULT_DROPS_DATA;
use crate::catalog::{CardCatalog, DEFAULT_CATALOG_DATA};
use crate::rates::DEFAULT_RATES_DATA;

pub const CONFIG_RATES: &str = "rates";
pub const CONFIG_DROPS: &str = "drops";
pub const CONFIG_BATTLE: &str = "battle";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("unknown config asset {0}")]
    Unknown(String),
    #[error("failed to parse {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Serves the compiled-in catalog and configuration assets.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDataLoader;

impl StaticDataLoader {
    fn parse<T: DeserializeOwned>(name: &str, json: &str) -> Result<T, AssetError> {
        serde_json::from_str(json).map_err(|source| AssetError::Parse {
            name: name.to_string(),
            source,
        })
    }
}

impl DataLoader for StaticDataLoader {
    type Error = AssetError;

    fn load_catalog(&self) -> Result<CardCatalog, Self::Error> {
        Self::parse("catalog", DEFAULT_CATALOG_DATA)
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        let json = match config_name {
            CONFIG_RATES => DEFAULT_RATES_DATA,
            CONFIG_DROPS => DEFAULT_DROPS_DATA,
            CONFIG_BATTLE => DEFAULT_BATTLE_DATA,
            other => return Err(AssetError::Unknown(other.to_string())),
        };
        Self::parse(config_name, json)
    }
}
