use std::sync::Arc;

use async_trait::async_trait;
use mandi_advisor::{
    domain::{Action, AdvisorError, Coordinate, PriceQuote, Urgency, WeatherSignal},
    infra::{
        location::{FixedLocation, LocationError, LocationProvider},
        prices::{PriceSource, PriceSourceError, StaticPriceSource, SyntheticPriceSource},
    },
    Advisor, AdvisorConfig,
};
use time::macros::date;

const NEW_DELHI: Coordinate = Coordinate::new(28.6139, 77.2090);
const BIKANER: Coordinate = Coordinate::new(28.0229, 73.3119);

fn config() -> Arc<AdvisorConfig> {
    Arc::new(AdvisorConfig::embedded().expect("embedded config"))
}

fn advisor_at(origin: Coordinate, prices: impl PriceSource + 'static) -> Advisor {
    Advisor::new(config(), Arc::new(prices), Arc::new(FixedLocation(origin)))
}

/// Every configured market quoting the same price, except for `overrides`.
fn uniform_prices(price: f64, overrides: &[(&str, f64)]) -> StaticPriceSource {
    let prices: Vec<(String, f64)> = config()
        .markets
        .iter()
        .map(|m| {
            let price = overrides
                .iter()
                .find(|(id, _)| *id == m.id)
                .map(|(_, p)| *p)
                .unwrap_or(price);
            (m.id.clone(), price)
        })
        .collect();
    StaticPriceSource::new(prices).with_date(date!(2024 - 11 - 04))
}

struct DeniedLocation;

#[async_trait]
impl LocationProvider for DeniedLocation {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unavailable("user denied geolocation".to_string()))
    }
}

struct BrokenPrices;

#[async_trait]
impl PriceSource for BrokenPrices {
    async fn quotes(&self, _commodity: &str) -> Result<Vec<PriceQuote>, PriceSourceError> {
        Err(PriceSourceError::Unavailable("oracle offline".to_string()))
    }
}

#[tokio::test]
async fn small_tomato_load_goes_by_bike() {
    let advisor = advisor_at(NEW_DELHI, uniform_prices(22.0, &[]));
    let options = advisor.rank_markets("Tomato", 30.0).await.unwrap();

    assert_eq!(options.len(), config().markets.len());
    for option in &options {
        assert_eq!(option.transport.vehicle_class, "bike");
        assert_eq!(
            option.transport.total_fare,
            (option.distance * 2.0).max(20.0).round()
        );
    }
}

#[tokio::test]
async fn rice_at_distress_prices_from_far_away_is_held() {
    let advisor = advisor_at(BIKANER, uniform_prices(4.0, &[]));
    let advice = advisor.recommend("Rice", 1000.0, None).await.unwrap();
    let report = &advice.report;

    assert_eq!(report.summary.profitable_count, 0);
    assert!(report.summary.top_options.iter().all(|o| o.net_profit < 0.0));
    assert_eq!(report.recommendation.action, Action::HoldOrIncreaseQuantity);
    assert_eq!(report.recommendation.urgency, Urgency::Low);
    assert!(report.recommendation.warning.is_some());
    let min_quantity = report.min_quantity_for_profit.expect("break-even estimate");
    assert!(f64::from(min_quantity) > 1000.0);
    assert_eq!(report.nearest.option.mandi.id, "muhana");
}

#[tokio::test]
async fn single_profitable_market_means_sell_now() {
    let advisor = advisor_at(NEW_DELHI, uniform_prices(0.5, &[("azadpur", 20.0)]));
    let advice = advisor.recommend("Tomato", 400.0, None).await.unwrap();
    let report = &advice.report;

    assert_eq!(report.summary.profitable_count, 1);
    assert_eq!(report.recommendation.action, Action::SellNow);
    assert_eq!(report.recommendation.urgency, Urgency::High);
    assert!(report.recommendation.reason.contains("Azadpur Mandi"));
    assert_eq!(report.best.option.mandi.id, "azadpur");
    assert!(report.min_quantity_for_profit.is_none());
}

#[tokio::test]
async fn empty_market_set_ranks_empty_and_refuses_to_recommend() {
    let advisor = advisor_at(NEW_DELHI, StaticPriceSource::default());

    let options = advisor.rank_markets("Onion", 250.0).await.unwrap();
    assert!(options.is_empty());

    let result = advisor.recommend("Onion", 250.0, None).await;
    assert!(matches!(result, Err(AdvisorError::EmptyMarketSet)));
}

#[tokio::test]
async fn ranking_orders_profitable_first_then_by_profit() {
    let cfg = config();
    for (seed, quantity) in [(1, 40.0), (2, 120.0), (3, 600.0), (4, 2500.0), (5, 9000.0)] {
        let prices = SyntheticPriceSource::from_config(&cfg, Some(seed));
        let advisor = advisor_at(NEW_DELHI, prices);
        let options = advisor.rank_markets("Onion", quantity).await.unwrap();

        let first_loss = options
            .iter()
            .position(|o| !o.is_profitable)
            .unwrap_or(options.len());
        assert!(options[first_loss..].iter().all(|o| !o.is_profitable));
        for group in [&options[..first_loss], &options[first_loss..]] {
            for pair in group.windows(2) {
                assert!(pair[0].net_profit >= pair[1].net_profit);
            }
        }
        for option in &options {
            let expected = option.gross_revenue - option.transport.total_fare;
            assert!((option.net_profit - expected).abs() < 0.005);
        }
    }
}

#[tokio::test]
async fn denied_location_uses_default_city() {
    let cfg = config();
    let fallback = cfg.default_location;
    let prices = uniform_prices(20.0, &[]);
    let advisor = Advisor::new(cfg, Arc::new(prices), Arc::new(DeniedLocation));

    assert_eq!(advisor.get_location().await, fallback);
    let advice = advisor.recommend("Wheat", 500.0, None).await.unwrap();
    assert_eq!(advice.origin, fallback);
}

#[tokio::test]
async fn price_source_failure_propagates() {
    let advisor = advisor_at(NEW_DELHI, BrokenPrices);
    let result = advisor.rank_markets("Onion", 100.0).await;
    assert!(matches!(result, Err(AdvisorError::PriceSource(_))));
}

#[tokio::test]
async fn non_positive_quantity_is_rejected() {
    let advisor = advisor_at(NEW_DELHI, uniform_prices(20.0, &[]));
    for quantity in [0.0, -10.0] {
        let result = advisor.recommend("Onion", quantity, None).await;
        assert!(matches!(result, Err(AdvisorError::InvalidQuantity(_))));
    }
}

#[tokio::test]
async fn unknown_commodity_is_priced_from_default() {
    let cfg = config();
    let default_price = cfg.default_price_per_kg;
    let advisor = advisor_at(NEW_DELHI, SyntheticPriceSource::from_config(&cfg, Some(11)));
    let options = advisor.rank_markets("Dragonfruit", 300.0).await.unwrap();

    assert!(!options.is_empty());
    for option in &options {
        assert!(option.price() >= default_price * 0.85 - 0.01);
        assert!(option.price() <= default_price * 1.15 + 0.01);
    }
}

#[tokio::test]
async fn rain_forecast_adds_advice() {
    let advisor = advisor_at(NEW_DELHI, uniform_prices(20.0, &[]));
    let advice = advisor
        .recommend(
            "Potato",
            500.0,
            Some(WeatherSignal {
                rain_forecast: true,
            }),
        )
        .await
        .unwrap();
    assert!(advice.report.recommendation.weather_advice.is_some());
}
