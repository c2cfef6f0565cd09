use serde::{Deserialize, Serialize};
use time::Date;

/// A point on the earth's surface, in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Identifier for a mandi in the market table.
pub type MandiId = String;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MandiKind {
    #[default]
    Wholesale,
    Apmc,
    Terminal,
    Retail,
}

impl MandiKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Wholesale => "Wholesale",
            Self::Apmc => "APMC",
            Self::Terminal => "Terminal market",
            Self::Retail => "Retail",
        }
    }

    /// Usual trading window for this kind of market.
    pub fn trading_hours(&self) -> &'static str {
        match self {
            Self::Wholesale => "04:00 - 11:00",
            Self::Apmc => "06:00 - 14:00",
            Self::Terminal => "03:00 - 10:00",
            Self::Retail => "08:00 - 20:00",
        }
    }
}

/// A regulated produce market. Loaded once from configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mandi {
    pub id: MandiId,
    pub name: String,
    pub district: String,
    pub state: String,
    pub coordinate: Coordinate,
    #[serde(rename = "type", default)]
    pub kind: MandiKind,
}

impl Mandi {
    /// "Name, District" for display.
    pub fn display_name(&self) -> String {
        if self.district.is_empty() || self.district == self.name {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.district)
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl DemandLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Price offered by one mandi for one commodity on one day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub mandi_id: MandiId,
    pub commodity: String,
    pub price_per_unit: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub date: Date,
    pub demand_level: DemandLevel,
    pub trading_hours: String,
}

/// Cost of moving a load from the farm to one mandi.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportEstimate {
    pub vehicle_class: String,
    pub distance: f64,
    pub trip_count: u32,
    /// Rounded to the nearest rupee for reporting.
    pub fare_per_trip: f64,
    pub total_fare: f64,
    pub fare_per_unit: f64,
}

/// One market evaluated for a concrete quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedOption {
    pub mandi: Mandi,
    pub quote: PriceQuote,
    pub transport: TransportEstimate,
    pub distance: f64,
    pub gross_revenue: f64,
    pub net_profit: f64,
    pub profit_per_unit: f64,
    pub profit_margin_percent: f64,
    pub is_profitable: bool,
}

impl RankedOption {
    pub fn price(&self) -> f64 {
        self.quote.price_per_unit
    }
}

/// Optional outside signal used to attach transport advice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSignal {
    pub rain_forecast: bool,
}

/// A commodity known to the advisor, with the base price used by the
/// synthetic price source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commodity {
    pub name: String,
    pub base_price_per_kg: f64,
}
