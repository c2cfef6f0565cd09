//! Market ranking by net profit after transport.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, warn};

use super::entities::{Coordinate, Mandi, PriceQuote, RankedOption};
use super::error::{validate_quantity, AdvisorResult};
use super::geo::{distance_km, round_to};
use super::transport::TariffTable;

/// Combines price quotes with distance and fares for one origin.
pub struct ProfitabilityRanker<'a> {
    markets: HashMap<&'a str, &'a Mandi>,
    tariff: &'a TariffTable,
}

impl<'a> ProfitabilityRanker<'a> {
    pub fn new(markets: &'a [Mandi], tariff: &'a TariffTable) -> Self {
        Self {
            markets: markets.iter().map(|m| (m.id.as_str(), m)).collect(),
            tariff,
        }
    }

    /// Evaluate every quote and return the options best first.
    ///
    /// Quotes are evaluated in the order given, which is also the tie-break
    /// order between options with equal net profit.
    pub fn rank(
        &self,
        quantity: f64,
        origin: Coordinate,
        quotes: &[PriceQuote],
    ) -> AdvisorResult<Vec<RankedOption>> {
        let quantity = validate_quantity(quantity)?;
        let mut options = Vec::with_capacity(quotes.len());

        for quote in quotes {
            let Some(mandi) = self.markets.get(quote.mandi_id.as_str()) else {
                warn!(mandi_id = %quote.mandi_id, "quote for unknown mandi skipped");
                continue;
            };
            let option = self.evaluate(mandi, quote, quantity, origin)?;
            debug!(
                mandi = %mandi.name,
                distance_km = option.distance,
                vehicle = %option.transport.vehicle_class,
                net_profit = option.net_profit,
                "evaluated market"
            );
            options.push(option);
        }

        sort_options(&mut options);
        Ok(options)
    }

    fn evaluate(
        &self,
        mandi: &Mandi,
        quote: &PriceQuote,
        quantity: f64,
        origin: Coordinate,
    ) -> AdvisorResult<RankedOption> {
        let distance = distance_km(origin, mandi.coordinate);
        let transport = self.tariff.estimate_fare(distance, quantity)?;

        let gross_revenue = round_to(quote.price_per_unit * quantity, 2);
        let net_profit = round_to(gross_revenue - transport.total_fare, 2);
        let profit_margin_percent = if gross_revenue != 0.0 {
            (100.0 * net_profit / gross_revenue).round()
        } else {
            0.0
        };

        Ok(RankedOption {
            mandi: mandi.clone(),
            quote: quote.clone(),
            transport,
            distance,
            gross_revenue,
            net_profit,
            profit_per_unit: round_to(net_profit / quantity, 2),
            profit_margin_percent,
            is_profitable: net_profit > 0.0,
        })
    }
}

/// Profitable options first, then by descending net profit. Stable.
pub fn sort_options(options: &mut [RankedOption]) {
    options.sort_by(|a, b| {
        b.is_profitable.cmp(&a.is_profitable).then_with(|| {
            b.net_profit
                .partial_cmp(&a.net_profit)
                .unwrap_or(Ordering::Equal)
        })
    });
}

/// The option with the shortest distance; the earlier one wins ties.
pub fn nearest_option(options: &[RankedOption]) -> Option<&RankedOption> {
    options.iter().reduce(|nearest, candidate| {
        if candidate.distance < nearest.distance {
            candidate
        } else {
            nearest
        }
    })
}
