//! Price quote sources.
//!
//! - `SyntheticPriceSource` fabricates plausible quotes around a base price per
//!   commodity. Seed it for reproducible runs.
//! - `StaticPriceSource` replays fixed per-mandi prices, e.g. loaded from a
//!   JSON file.

use std::{collections::HashMap, fs, path::Path, sync::Mutex};

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use thiserror::Error;
use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::config::AdvisorConfig;
use crate::domain::{geo::round_to, DemandLevel, MandiId, MandiKind, PriceQuote};

/// Largest relative deviation of a market's price from the base price.
const MARKET_SPREAD: f64 = 0.15;
const BAND_MIN: f64 = 0.02;
const BAND_MAX: f64 = 0.08;

#[derive(Debug, Error)]
pub enum PriceSourceError {
    #[error("price source unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read quotes: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse quotes: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Supplies one quote per known market for a commodity.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn quotes(&self, commodity: &str) -> Result<Vec<PriceQuote>, PriceSourceError>;
}

pub struct SyntheticPriceSource {
    markets: Vec<(MandiId, MandiKind)>,
    base_prices: HashMap<String, f64>,
    default_price: f64,
    date: Option<Date>,
    rng: Mutex<ChaCha8Rng>,
}

impl SyntheticPriceSource {
    /// Quotes for every market in `config`. `None` seeds from OS entropy.
    pub fn from_config(config: &AdvisorConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            markets: config
                .markets
                .iter()
                .map(|m| (m.id.clone(), m.kind))
                .collect(),
            base_prices: config
                .commodities
                .iter()
                .map(|c| (c.name.to_lowercase(), c.base_price_per_kg))
                .collect(),
            default_price: config.default_price_per_kg,
            date: None,
            rng: Mutex::new(rng),
        }
    }

    /// Stamp quotes with a fixed date instead of today.
    pub fn with_date(mut self, date: Date) -> Self {
        self.date = Some(date);
        self
    }

    /// Base price for `commodity`, or the configured default when unknown.
    pub fn base_price(&self, commodity: &str) -> f64 {
        match self.base_prices.get(&commodity.to_lowercase()) {
            Some(price) => *price,
            None => {
                debug!(
                    commodity,
                    price = self.default_price,
                    "unknown commodity, using default price"
                );
                self.default_price
            }
        }
    }
}

#[async_trait]
impl PriceSource for SyntheticPriceSource {
    async fn quotes(&self, commodity: &str) -> Result<Vec<PriceQuote>, PriceSourceError> {
        let base = self.base_price(commodity);
        let date = self
            .date
            .unwrap_or_else(|| OffsetDateTime::now_utc().date());
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| PriceSourceError::Unavailable("price generator poisoned".to_string()))?;

        let quotes = self
            .markets
            .iter()
            .map(|(mandi_id, kind)| {
                let spread = rng.gen_range(-MARKET_SPREAD..=MARKET_SPREAD);
                let price = round_to(base * (1.0 + spread), 2);
                let min_price = round_to(price * (1.0 - rng.gen_range(BAND_MIN..=BAND_MAX)), 2);
                let max_price = round_to(price * (1.0 + rng.gen_range(BAND_MIN..=BAND_MAX)), 2);
                let demand_level = match rng.gen_range(0..3) {
                    0 => DemandLevel::Low,
                    1 => DemandLevel::Medium,
                    _ => DemandLevel::High,
                };
                PriceQuote {
                    mandi_id: mandi_id.clone(),
                    commodity: commodity.to_string(),
                    price_per_unit: price,
                    min_price,
                    max_price,
                    date,
                    demand_level,
                    trading_hours: kind.trading_hours().to_string(),
                }
            })
            .collect();

        Ok(quotes)
    }
}

/// One fixed price entry, as read from a quotes file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticQuote {
    pub mandi_id: MandiId,
    pub price_per_unit: f64,
    #[serde(default)]
    pub demand_level: DemandLevel,
}

#[derive(Debug, Deserialize)]
struct QuotesFile {
    quotes: Vec<StaticQuote>,
}

/// Same prices for every commodity, in the order given.
#[derive(Clone, Debug, Default)]
pub struct StaticPriceSource {
    entries: Vec<StaticQuote>,
    date: Option<Date>,
}

impl StaticPriceSource {
    pub fn new<I, S>(prices: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<MandiId>,
    {
        Self {
            entries: prices
                .into_iter()
                .map(|(mandi_id, price_per_unit)| StaticQuote {
                    mandi_id: mandi_id.into(),
                    price_per_unit,
                    demand_level: DemandLevel::Medium,
                })
                .collect(),
            date: None,
        }
    }

    pub fn from_entries(entries: Vec<StaticQuote>) -> Self {
        Self {
            entries,
            date: None,
        }
    }

    /// Load `{"quotes": [{"mandiId": .., "pricePerUnit": ..}, ..]}`.
    pub fn from_path(path: &Path) -> Result<Self, PriceSourceError> {
        let content = fs::read_to_string(path)?;
        let file: QuotesFile = serde_json::from_str(&content)?;
        debug!(path = %path.display(), count = file.quotes.len(), "loaded static quotes");
        Ok(Self::from_entries(file.quotes))
    }

    pub fn with_date(mut self, date: Date) -> Self {
        self.date = Some(date);
        self
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    async fn quotes(&self, commodity: &str) -> Result<Vec<PriceQuote>, PriceSourceError> {
        let date = self
            .date
            .unwrap_or_else(|| OffsetDateTime::now_utc().date());
        Ok(self
            .entries
            .iter()
            .map(|entry| PriceQuote {
                mandi_id: entry.mandi_id.clone(),
                commodity: commodity.to_string(),
                price_per_unit: entry.price_per_unit,
                min_price: entry.price_per_unit,
                max_price: entry.price_per_unit,
                date,
                demand_level: entry.demand_level,
                trading_hours: String::new(),
            })
            .collect())
    }
}
