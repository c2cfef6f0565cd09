//! Profitability computation and selling advice live here.

pub mod entities;
pub mod error;
pub mod geo;
pub mod ranking;
pub mod recommendation;
pub mod transport;

pub use entities::{
    Commodity, Coordinate, DemandLevel, Mandi, MandiId, MandiKind, PriceQuote, RankedOption,
    TransportEstimate, WeatherSignal,
};
pub use error::{AdvisorError, AdvisorResult};
pub use geo::distance_km;
pub use ranking::{nearest_option, sort_options, ProfitabilityRanker};
pub use recommendation::{
    break_even_quantity, recommend, Action, MarketSummary, Pick, PickStatus, Recommendation,
    RecommendationReport, Urgency,
};
pub use transport::{BikeTariff, TariffError, TariffTable, VehicleTier};
