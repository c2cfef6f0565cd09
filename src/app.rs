use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::{
    config::AdvisorConfig,
    domain::{
        error::validate_quantity, recommend, AdvisorResult, Coordinate, ProfitabilityRanker,
        RankedOption, RecommendationReport, WeatherSignal,
    },
    infra::{
        location::{resolve_location, LocationProvider},
        prices::PriceSource,
    },
};

/// A recommendation as handed to the caller, tagged for log correlation.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advice {
    pub request_id: Uuid,
    pub generated_at: OffsetDateTime,
    pub origin: Coordinate,
    #[serde(flatten)]
    pub report: RecommendationReport,
}

/// Entry point tying the reference data to the price and location
/// collaborators. Cheap to share; every call works on fresh quotes.
#[derive(Clone)]
pub struct Advisor {
    config: Arc<AdvisorConfig>,
    prices: Arc<dyn PriceSource>,
    location: Arc<dyn LocationProvider>,
}

impl Advisor {
    pub fn new(
        config: Arc<AdvisorConfig>,
        prices: Arc<dyn PriceSource>,
        location: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            config,
            prices,
            location,
        }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Caller position, or the configured default if it cannot be found in time.
    pub async fn get_location(&self) -> Coordinate {
        resolve_location(
            self.location.as_ref(),
            self.config.location_timeout(),
            self.config.default_location,
        )
        .await
    }

    pub fn list_commodities(&self) -> Vec<String> {
        self.config.commodity_names()
    }

    /// Markets for `commodity`, best net profit first. Empty if no market quotes.
    pub async fn rank_markets(
        &self,
        commodity: &str,
        quantity: f64,
    ) -> AdvisorResult<Vec<RankedOption>> {
        let quantity = validate_quantity(quantity)?;
        let origin = self.get_location().await;
        self.rank_from(commodity, quantity, origin).await
    }

    pub async fn recommend(
        &self,
        commodity: &str,
        quantity: f64,
        weather: Option<WeatherSignal>,
    ) -> AdvisorResult<Advice> {
        let request_id = Uuid::new_v4();
        let span = info_span!("recommend", %request_id, commodity, quantity);
        self.advise(request_id, commodity, quantity, weather)
            .instrument(span)
            .await
    }

    async fn advise(
        &self,
        request_id: Uuid,
        commodity: &str,
        quantity: f64,
        weather: Option<WeatherSignal>,
    ) -> AdvisorResult<Advice> {
        let quantity = validate_quantity(quantity)?;
        let origin = self.get_location().await;
        let options = self.rank_from(commodity, quantity, origin).await?;
        let report = recommend(commodity, quantity, &options, weather)?;

        info!(
            action = %report.recommendation.action,
            urgency = %report.recommendation.urgency,
            best = %report.best.option.mandi.name,
            profitable = report.summary.profitable_count,
            "recommendation ready"
        );

        Ok(Advice {
            request_id,
            generated_at: OffsetDateTime::now_utc(),
            origin,
            report,
        })
    }

    async fn rank_from(
        &self,
        commodity: &str,
        quantity: f64,
        origin: Coordinate,
    ) -> AdvisorResult<Vec<RankedOption>> {
        let quotes = self.prices.quotes(commodity).await?;
        info!(commodity, quotes = quotes.len(), "received price quotes");

        let ranker = ProfitabilityRanker::new(&self.config.markets, &self.config.tariff);
        ranker.rank(quantity, origin, &quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AdvisorError;
    use crate::infra::location::FixedLocation;
    use crate::infra::prices::StaticPriceSource;

    fn advisor(prices: StaticPriceSource) -> Advisor {
        let config = Arc::new(AdvisorConfig::embedded().unwrap());
        let here = config.default_location;
        Advisor::new(config, Arc::new(prices), Arc::new(FixedLocation(here)))
    }

    #[test]
    fn test_list_commodities_follows_config_order() {
        let advisor = advisor(StaticPriceSource::default());
        let names = advisor.list_commodities();
        assert_eq!(names.first().map(String::as_str), Some("Tomato"));
        assert_eq!(names.len(), advisor.config().commodities.len());
    }

    #[tokio::test]
    async fn test_rank_rejects_bad_quantity_before_lookup() {
        let advisor = advisor(StaticPriceSource::new([("azadpur", 20.0)]));
        let result = advisor.rank_markets("Onion", -1.0).await;
        assert!(matches!(result, Err(AdvisorError::InvalidQuantity(_))));
    }

    #[tokio::test]
    async fn test_advice_serializes_flat() {
        let advisor = advisor(StaticPriceSource::new([("azadpur", 30.0), ("okhla", 25.0)]));
        let advice = advisor.recommend("Onion", 400.0, None).await.unwrap();
        let json = serde_json::to_value(&advice).unwrap();

        assert!(json.get("requestId").is_some());
        assert!(json.get("recommendation").is_some());
        assert_eq!(json["commodity"], "Onion");
        assert_eq!(json["summary"]["totalMarkets"], 2);
    }
}
