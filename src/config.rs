//! Immutable reference data: markets, tariffs, commodities and defaults.
//!
//! Loaded once at startup from, in order of preference, an explicit path,
//! the per-user config file, or the copy embedded in the binary.

use std::{collections::HashSet, fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::{Commodity, Coordinate, Mandi, TariffError, TariffTable};
use crate::infra::location::DEFAULT_LOCATION_ENDPOINT;
use crate::util::{assets, persistence};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("embedded configuration {0} is missing")]
    MissingEmbedded(&'static str),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tariff table: {0}")]
    Tariff(#[from] TariffError),
    #[error("duplicate mandi id {0}")]
    DuplicateMandi(String),
    #[error("commodity {0} must have a positive base price")]
    CommodityPrice(String),
    #[error("default price must be positive, got {0}")]
    DefaultPrice(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorConfig {
    pub markets: Vec<Mandi>,
    #[serde(default)]
    pub tariff: TariffTable,
    pub commodities: Vec<Commodity>,
    /// Used whenever the caller's position cannot be determined.
    pub default_location: Coordinate,
    /// Base price for commodities missing from `commodities`.
    pub default_price_per_kg: f64,
    #[serde(default = "default_location_timeout_secs")]
    pub location_timeout_secs: u64,
    #[serde(default = "default_location_endpoint")]
    pub location_endpoint: String,
}

fn default_location_timeout_secs() -> u64 {
    10
}

fn default_location_endpoint() -> String {
    DEFAULT_LOCATION_ENDPOINT.to_string()
}

impl AdvisorConfig {
    /// The configuration shipped inside the binary.
    pub fn embedded() -> Result<Self, ConfigError> {
        let text = embedded_text()?;
        Self::from_json(&text)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path, else the user config file if it exists, else embedded.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!(path = %path.display(), "loading configuration");
            return Self::from_path(path);
        }
        if let Some(path) = persistence::user_config_file().filter(|p| p.exists()) {
            info!(path = %path.display(), "loading user configuration");
            return Self::from_path(&path);
        }
        info!("using embedded configuration");
        Self::embedded()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tariff.validate()?;

        let mut seen = HashSet::new();
        for mandi in &self.markets {
            if !seen.insert(mandi.id.as_str()) {
                return Err(ConfigError::DuplicateMandi(mandi.id.clone()));
            }
        }
        for commodity in &self.commodities {
            if !(commodity.base_price_per_kg > 0.0) {
                return Err(ConfigError::CommodityPrice(commodity.name.clone()));
            }
        }
        if !(self.default_price_per_kg > 0.0) {
            return Err(ConfigError::DefaultPrice(self.default_price_per_kg));
        }
        Ok(())
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_secs(self.location_timeout_secs)
    }

    pub fn commodity_names(&self) -> Vec<String> {
        self.commodities.iter().map(|c| c.name.clone()).collect()
    }
}

/// The embedded default configuration as text, e.g. to seed a user file.
pub fn embedded_text() -> Result<String, ConfigError> {
    assets::load_text(assets::DEFAULT_CONFIG)
        .ok_or(ConfigError::MissingEmbedded(assets::DEFAULT_CONFIG))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_is_valid() {
        let config = AdvisorConfig::embedded().unwrap();
        assert!(!config.markets.is_empty());
        assert_eq!(config.tariff, TariffTable::default());
        assert_eq!(config.location_timeout(), Duration::from_secs(10));
        assert!(config.commodity_names().iter().any(|name| name == "Tomato"));
        assert!(config.commodity_names().iter().any(|name| name == "Rice"));
    }

    #[test]
    fn test_missing_optional_fields_take_defaults() {
        let json = r#"{
            "markets": [],
            "commodities": [],
            "defaultLocation": {"latitude": 1.0, "longitude": 2.0},
            "defaultPricePerKg": 10.0
        }"#;
        let config = AdvisorConfig::from_json(json).unwrap();
        assert_eq!(config.tariff, TariffTable::default());
        assert_eq!(config.location_timeout_secs, 10);
        assert_eq!(config.location_endpoint, DEFAULT_LOCATION_ENDPOINT);
    }

    #[test]
    fn test_duplicate_mandi_rejected() {
        let mut config = AdvisorConfig::embedded().unwrap();
        let first = config.markets[0].clone();
        config.markets.push(first);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateMandi(_))
        ));
    }

    #[test]
    fn test_unordered_tariff_rejected() {
        let json = r#"{
            "markets": [],
            "commodities": [],
            "defaultLocation": {"latitude": 1.0, "longitude": 2.0},
            "defaultPricePerKg": 10.0,
            "tariff": {"tiers": [
                {"name": "big", "baseRate": 1.0, "perKmRate": 1.0, "maxLoad": 900.0},
                {"name": "small", "baseRate": 1.0, "perKmRate": 1.0, "maxLoad": 100.0}
            ]}
        }"#;
        assert!(matches!(
            AdvisorConfig::from_json(json),
            Err(ConfigError::Tariff(TariffError::Unordered(_)))
        ));
    }

    #[test]
    fn test_bad_prices_rejected() {
        let mut config = AdvisorConfig::embedded().unwrap();
        config.default_price_per_kg = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DefaultPrice(_))
        ));

        let mut config = AdvisorConfig::embedded().unwrap();
        config.commodities[0].base_price_per_kg = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CommodityPrice(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            AdvisorConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
