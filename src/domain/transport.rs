//! Tiered transport fares.
//!
//! Small loads travel by bike at a flat-ish rate. Everything else picks the
//! smallest vehicle tier that carries the load in one trip (or the largest
//! tier, making several trips) and pays one-way fare plus a discounted
//! return leg.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::TransportEstimate;
use super::error::{validate_quantity, AdvisorError, AdvisorResult};
use super::geo::round_to;

pub const BIKE_CLASS: &str = "bike";

/// Rates for loads too small to justify a motor vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BikeTariff {
    /// Loads strictly below this go by bike.
    pub max_quantity: f64,
    pub min_fare: f64,
    pub per_km_rate: f64,
}

impl Default for BikeTariff {
    fn default() -> Self {
        Self {
            max_quantity: 50.0,
            min_fare: 20.0,
            per_km_rate: 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleTier {
    pub name: String,
    pub base_rate: f64,
    pub per_km_rate: f64,
    /// Maximum load per trip, in kg.
    pub max_load: f64,
}

impl VehicleTier {
    fn new(name: &str, base_rate: f64, per_km_rate: f64, max_load: f64) -> Self {
        Self {
            name: name.to_string(),
            base_rate,
            per_km_rate,
            max_load,
        }
    }

    /// One-way fare for a single trip, unrounded.
    pub fn trip_fare(&self, distance_km: f64) -> f64 {
        self.base_rate + distance_km * self.per_km_rate
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffTable {
    #[serde(default)]
    pub bike: BikeTariff,
    /// Sorted by ascending `max_load`.
    pub tiers: Vec<VehicleTier>,
    /// Multiplier on the outbound fare covering the empty return trip.
    #[serde(default = "default_return_leg_factor")]
    pub return_leg_factor: f64,
}

fn default_return_leg_factor() -> f64 {
    1.5
}

impl Default for TariffTable {
    fn default() -> Self {
        Self {
            bike: BikeTariff::default(),
            tiers: vec![
                VehicleTier::new("auto", 20.0, 8.0, 150.0),
                VehicleTier::new("tempo", 80.0, 12.0, 800.0),
                VehicleTier::new("truck", 300.0, 18.0, 5000.0),
            ],
            return_leg_factor: default_return_leg_factor(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TariffError {
    #[error("tariff table has no vehicle tiers")]
    NoTiers,
    #[error("vehicle tier {0} must have a positive load capacity")]
    NonPositiveCapacity(String),
    #[error("vehicle tier {0} is out of order; tiers must have strictly ascending capacity")]
    Unordered(String),
    #[error("return leg factor must be at least 1.0, got {0}")]
    ReturnLegFactor(f64),
}

impl TariffTable {
    pub fn validate(&self) -> Result<(), TariffError> {
        if self.tiers.is_empty() {
            return Err(TariffError::NoTiers);
        }
        let mut previous = 0.0;
        for tier in &self.tiers {
            if !(tier.max_load > 0.0) {
                return Err(TariffError::NonPositiveCapacity(tier.name.clone()));
            }
            if tier.max_load <= previous {
                return Err(TariffError::Unordered(tier.name.clone()));
            }
            previous = tier.max_load;
        }
        if !(self.return_leg_factor >= 1.0) {
            return Err(TariffError::ReturnLegFactor(self.return_leg_factor));
        }
        Ok(())
    }

    /// Smallest tier that carries `quantity` in one trip, else the largest.
    pub fn select_tier(&self, quantity: f64) -> Option<&VehicleTier> {
        self.tiers
            .iter()
            .find(|tier| quantity <= tier.max_load)
            .or_else(|| self.tiers.last())
    }

    pub fn estimate_fare(
        &self,
        distance_km: f64,
        quantity: f64,
    ) -> AdvisorResult<TransportEstimate> {
        let quantity = validate_quantity(quantity)?;

        // validate() guarantees at least one tier; an empty table leaves only the bike.
        let tier = match self.select_tier(quantity) {
            Some(tier) if quantity >= self.bike.max_quantity => tier,
            _ => return Ok(self.bike_estimate(distance_km, quantity)),
        };

        let trips = (quantity / tier.max_load).ceil();
        if trips > f64::from(u32::MAX) {
            return Err(AdvisorError::InvalidQuantity(quantity));
        }
        let trip_count = trips as u32;
        let fare_per_trip = tier.trip_fare(distance_km);
        let total_fare = (fare_per_trip * trips * self.return_leg_factor).round();

        Ok(TransportEstimate {
            vehicle_class: tier.name.clone(),
            distance: distance_km,
            trip_count,
            fare_per_trip: fare_per_trip.round(),
            total_fare,
            fare_per_unit: round_to(total_fare / quantity, 2),
        })
    }

    fn bike_estimate(&self, distance_km: f64, quantity: f64) -> TransportEstimate {
        let fare_per_trip = (distance_km * self.bike.per_km_rate).max(self.bike.min_fare);
        let total_fare = fare_per_trip.round();
        TransportEstimate {
            vehicle_class: BIKE_CLASS.to_string(),
            distance: distance_km,
            trip_count: 1,
            fare_per_trip,
            total_fare,
            fare_per_unit: round_to(total_fare / quantity, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TariffTable {
        TariffTable::default()
    }

    #[test]
    fn test_default_table_is_valid() {
        assert_eq!(table().validate(), Ok(()));
    }

    #[test]
    fn test_small_load_goes_by_bike() {
        let estimate = table().estimate_fare(12.3, 30.0).unwrap();
        assert_eq!(estimate.vehicle_class, "bike");
        assert_eq!(estimate.trip_count, 1);
        assert_eq!(estimate.fare_per_trip, 24.6);
        assert_eq!(estimate.total_fare, 25.0);
        assert_eq!(estimate.fare_per_unit, 0.83);
    }

    #[test]
    fn test_bike_minimum_fare() {
        let estimate = table().estimate_fare(3.0, 10.0).unwrap();
        assert_eq!(estimate.fare_per_trip, 20.0);
        assert_eq!(estimate.total_fare, 20.0);
        assert_eq!(estimate.fare_per_unit, 2.0);
    }

    #[test]
    fn test_tier_selection_boundaries() {
        let cases = [
            (50.0, "auto"),
            (150.0, "auto"),
            (150.5, "tempo"),
            (800.0, "tempo"),
            (801.0, "truck"),
            (12_000.0, "truck"),
        ];
        for (quantity, expected) in cases {
            let estimate = table().estimate_fare(10.0, quantity).unwrap();
            assert_eq!(estimate.vehicle_class, expected, "quantity {quantity}");
        }
    }

    #[test]
    fn test_tempo_fare_includes_return_leg() {
        // 80 + 25 * 12 = 380 one way, * 1.5 = 570
        let estimate = table().estimate_fare(25.0, 500.0).unwrap();
        assert_eq!(estimate.vehicle_class, "tempo");
        assert_eq!(estimate.fare_per_trip, 380.0);
        assert_eq!(estimate.total_fare, 570.0);
        assert_eq!(estimate.fare_per_unit, 1.14);
    }

    #[test]
    fn test_total_fare_uses_unrounded_trip_fare() {
        // 20 + 10.3 * 8 = 102.4 -> reported 102, total round(153.6) = 154
        let estimate = table().estimate_fare(10.3, 100.0).unwrap();
        assert_eq!(estimate.fare_per_trip, 102.0);
        assert_eq!(estimate.total_fare, 154.0);
    }

    #[test]
    fn test_oversized_load_needs_multiple_truck_trips() {
        // ceil(12000 / 5000) = 3 trips of 300 + 40 * 18 = 1020
        let estimate = table().estimate_fare(40.0, 12_000.0).unwrap();
        assert_eq!(estimate.trip_count, 3);
        assert_eq!(estimate.total_fare, (1020.0_f64 * 3.0 * 1.5).round());
    }

    #[test]
    fn test_huge_load_counts_every_trip() {
        // 2e8 trucks of 300 + 10 * 18 = 480
        let estimate = table().estimate_fare(10.0, 1.0e12).unwrap();
        assert_eq!(estimate.trip_count, 200_000_000);
        assert_eq!(estimate.total_fare, 480.0 * 2.0e8 * 1.5);
    }

    #[test]
    fn test_trip_count_overflow_is_rejected() {
        // 1e14 / 5000 = 2e10 trips, more than a u32 holds
        let result = table().estimate_fare(10.0, 1.0e14);
        assert!(matches!(result, Err(AdvisorError::InvalidQuantity(q)) if q == 1.0e14));
    }

    #[test]
    fn test_fare_is_monotonic_in_distance_within_tier() {
        for quantity in [30.0, 100.0, 500.0, 2000.0, 9000.0] {
            let mut previous = 0.0;
            for step in 0..200 {
                let distance = step as f64 * 2.5;
                let estimate = table().estimate_fare(distance, quantity).unwrap();
                let fare = estimate.total_fare;
                assert!(fare >= previous, "q={quantity} d={distance}");
                previous = fare;
            }
        }
    }

    #[test]
    fn test_tier_capacity_is_non_decreasing_in_quantity() {
        let t = table();
        let capacity = |quantity: f64| match t.select_tier(quantity) {
            Some(tier) => tier.max_load,
            None => panic!("no tier for {quantity}"),
        };
        let quantities = [50.0, 149.0, 150.0, 151.0, 799.0, 800.0, 801.0, 5000.0, 5001.0];
        for pair in quantities.windows(2) {
            assert!(capacity(pair[0]) <= capacity(pair[1]));
        }
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        for quantity in [0.0, -5.0, f64::NAN] {
            let result = table().estimate_fare(10.0, quantity);
            assert!(matches!(result, Err(AdvisorError::InvalidQuantity(_))));
        }
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        let mut t = table();
        t.tiers.swap(0, 1);
        assert_eq!(t.validate(), Err(TariffError::Unordered("auto".to_string())));

        let mut t = table();
        t.tiers.clear();
        assert_eq!(t.validate(), Err(TariffError::NoTiers));

        let mut t = table();
        t.tiers[0].max_load = 0.0;
        assert_eq!(
            t.validate(),
            Err(TariffError::NonPositiveCapacity("auto".to_string()))
        );

        let mut t = table();
        t.return_leg_factor = 0.5;
        assert_eq!(t.validate(), Err(TariffError::ReturnLegFactor(0.5)));
    }
}
