//! Turns ranked markets into a single piece of advice.
//!
//! The decision is a fixed cascade of rules evaluated top to bottom; the
//! first rule whose predicate holds produces the action. Weather advice and
//! secondary warnings are layered on afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entities::{DemandLevel, RankedOption, WeatherSignal};
use super::error::{validate_quantity, AdvisorError, AdvisorResult};
use super::geo::round_to;
use super::ranking::nearest_option;

/// Loads below this rarely cover transport; used in the hold warning.
pub const SUGGESTED_MIN_QUANTITY: f64 = 200.0;
pub const TOP_OPTIONS_LIMIT: usize = 5;

// Break-even estimate uses the tempo tariff as a first-order approximation.
// It does not invert the fare of whichever vehicle would actually be chosen.
pub const BREAK_EVEN_BASE_FARE: f64 = 80.0;
pub const BREAK_EVEN_PER_KM: f64 = 12.0;
pub const BREAK_EVEN_RETURN_FACTOR: f64 = 1.5;
pub const BREAK_EVEN_SAFETY_MARGIN: f64 = 10.0;

const PRICE_PREMIUM_FACTOR: f64 = 1.1;
const HEALTHY_PROFIT_SHARE: f64 = 0.7;
const HIGH_TRANSPORT_SHARE: f64 = 0.25;

const RAIN_ADVICE: &str =
    "Rain is forecast. Transport your produce early in the day to avoid spoilage and road delays.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "HOLD OR INCREASE QUANTITY")]
    HoldOrIncreaseQuantity,
    #[serde(rename = "SELL NOW")]
    SellNow,
    #[serde(rename = "SELL")]
    Sell,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Self::HoldOrIncreaseQuantity => "HOLD OR INCREASE QUANTITY",
            Self::SellNow => "SELL NOW",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub action: Action,
    pub urgency: Urgency,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_advice: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickStatus {
    Profitable,
    Loss,
}

impl PickStatus {
    fn of(option: &RankedOption) -> Self {
        if option.is_profitable {
            Self::Profitable
        } else {
            Self::Loss
        }
    }
}

/// A highlighted option together with whether it makes money.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    pub status: PickStatus,
    pub option: RankedOption,
}

impl Pick {
    fn new(option: &RankedOption) -> Self {
        Self {
            status: PickStatus::of(option),
            option: option.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub average_price: f64,
    pub best_profit: f64,
    /// Total fare of the best option minus that of the nearest one.
    pub transport_cost_spread: f64,
    pub profitable_count: usize,
    pub total_markets: usize,
    pub top_options: Vec<RankedOption>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationReport {
    pub commodity: String,
    pub quantity: f64,
    pub recommendation: Recommendation,
    pub best: Pick,
    pub nearest: Pick,
    pub summary: MarketSummary,
    /// Only present when every market loses money.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_quantity_for_profit: Option<u32>,
}

/// Facts derived once from the ranked options and shared by every rule.
struct DecisionContext<'a> {
    commodity: &'a str,
    quantity: f64,
    top: &'a RankedOption,
    average_price: f64,
    profitable_count: usize,
    all_loss: bool,
}

struct Rule {
    name: &'static str,
    applies: fn(&DecisionContext<'_>) -> bool,
    decide: fn(&DecisionContext<'_>) -> Recommendation,
}

/// Evaluated in order; the last rule always applies.
const RULES: &[Rule] = &[
    Rule {
        name: "all_markets_lose",
        applies: |ctx| ctx.all_loss,
        decide: hold_for_quantity,
    },
    Rule {
        name: "single_profitable_market",
        applies: |ctx| ctx.profitable_count == 1,
        decide: sell_at_only_market,
    },
    Rule {
        name: "price_premium",
        applies: |ctx| ctx.top.price() > PRICE_PREMIUM_FACTOR * ctx.average_price,
        decide: sell_at_premium,
    },
    Rule {
        name: "healthy_profit",
        applies: |ctx| {
            ctx.top.net_profit > HEALTHY_PROFIT_SHARE * (ctx.quantity * ctx.top.price())
        },
        decide: sell_with_healthy_profit,
    },
    Rule {
        name: "thin_margin",
        applies: |_| true,
        decide: sell_on_thin_margin,
    },
];

fn hold_for_quantity(ctx: &DecisionContext<'_>) -> Recommendation {
    Recommendation {
        action: Action::HoldOrIncreaseQuantity,
        urgency: Urgency::Low,
        reason: format!(
            "{} kg of {} is too little to cover transport costs to any market",
            ctx.quantity, ctx.commodity
        ),
        warning: Some(format!(
            "Every market loses money at this quantity. Pool produce with neighbours \
             and sell at least {SUGGESTED_MIN_QUANTITY} kg in one trip."
        )),
        weather_advice: None,
    }
}

fn sell_at_only_market(ctx: &DecisionContext<'_>) -> Recommendation {
    Recommendation {
        action: Action::SellNow,
        urgency: Urgency::High,
        reason: format!(
            "{} is the only market where {} sells at a profit (₹{:.0} after transport)",
            ctx.top.mandi.display_name(),
            ctx.commodity,
            ctx.top.net_profit
        ),
        warning: None,
        weather_advice: None,
    }
}

fn sell_at_premium(ctx: &DecisionContext<'_>) -> Recommendation {
    let premium = (ctx.top.price() / ctx.average_price - 1.0) * 100.0;
    Recommendation {
        action: Action::SellNow,
        urgency: Urgency::High,
        reason: format!(
            "{} pays ₹{:.2}/kg, {:.0}% above the ₹{:.2}/kg average across markets",
            ctx.top.mandi.display_name(),
            ctx.top.price(),
            premium,
            ctx.average_price
        ),
        warning: None,
        weather_advice: None,
    }
}

fn sell_with_healthy_profit(ctx: &DecisionContext<'_>) -> Recommendation {
    Recommendation {
        action: Action::Sell,
        urgency: Urgency::Medium,
        reason: format!(
            "{} returns ₹{:.0} after ₹{:.0} transport, a healthy margin of {:.0}%",
            ctx.top.mandi.display_name(),
            ctx.top.net_profit,
            ctx.top.transport.total_fare,
            ctx.top.profit_margin_percent
        ),
        warning: None,
        weather_advice: None,
    }
}

fn sell_on_thin_margin(ctx: &DecisionContext<'_>) -> Recommendation {
    Recommendation {
        action: Action::Sell,
        urgency: Urgency::Low,
        reason: format!(
            "{} gives the best net return (₹{:.0}) but margins are thin; no need to rush",
            ctx.top.mandi.display_name(),
            ctx.top.net_profit
        ),
        warning: None,
        weather_advice: None,
    }
}

/// Warnings that only apply when the chosen rule did not raise one.
fn secondary_warning(top: &RankedOption) -> Option<String> {
    if top.quote.demand_level == DemandLevel::Low {
        return Some(format!(
            "Demand is low at {}; prices may soften before you arrive",
            top.mandi.display_name()
        ));
    }
    if top.gross_revenue > 0.0
        && top.transport.total_fare > HIGH_TRANSPORT_SHARE * top.gross_revenue
    {
        let share = top.transport.total_fare / top.gross_revenue * 100.0;
        return Some(format!(
            "Transport takes {share:.0}% of the sale value at {}",
            top.mandi.display_name()
        ));
    }
    None
}

/// Rough smallest quantity at which the best price covers the trip to the
/// nearest market. See the `BREAK_EVEN_*` constants. `None` when the price
/// is not positive or the estimate does not fit in a `u32`.
pub fn break_even_quantity(nearest_distance_km: f64, best_price_per_unit: f64) -> Option<u32> {
    if !(best_price_per_unit > 0.0) {
        return None;
    }
    let fare =
        BREAK_EVEN_BASE_FARE + nearest_distance_km * BREAK_EVEN_PER_KM * BREAK_EVEN_RETURN_FACTOR;
    let quantity = (fare / best_price_per_unit).ceil() + BREAK_EVEN_SAFETY_MARGIN;
    (quantity <= f64::from(u32::MAX)).then(|| quantity as u32)
}

/// Builds the recommendation for options already sorted best first.
pub fn recommend(
    commodity: &str,
    quantity: f64,
    options: &[RankedOption],
    weather: Option<WeatherSignal>,
) -> AdvisorResult<RecommendationReport> {
    let quantity = validate_quantity(quantity)?;
    let (Some(top), Some(nearest)) = (options.first(), nearest_option(options)) else {
        return Err(AdvisorError::EmptyMarketSet);
    };

    let average_price = options.iter().map(RankedOption::price).sum::<f64>() / options.len() as f64;
    let profitable_count = options.iter().filter(|o| o.is_profitable).count();
    let all_loss = options.iter().all(|o| o.net_profit < 0.0);

    let ctx = DecisionContext {
        commodity,
        quantity,
        top,
        average_price,
        profitable_count,
        all_loss,
    };

    let rule = RULES
        .iter()
        .find(|rule| (rule.applies)(&ctx))
        .unwrap_or(&RULES[RULES.len() - 1]);
    let mut recommendation = (rule.decide)(&ctx);
    tracing::debug!(
        rule = rule.name,
        action = %recommendation.action,
        urgency = %recommendation.urgency,
        "recommendation rule matched"
    );

    if recommendation.warning.is_none() {
        recommendation.warning = secondary_warning(top);
    }
    if weather.is_some_and(|signal| signal.rain_forecast) {
        recommendation.weather_advice = Some(RAIN_ADVICE.to_string());
    }

    let min_quantity_for_profit = if all_loss {
        break_even_quantity(nearest.distance, top.price())
    } else {
        None
    };

    let summary = MarketSummary {
        average_price: round_to(average_price, 2),
        best_profit: top.net_profit,
        transport_cost_spread: top.transport.total_fare - nearest.transport.total_fare,
        profitable_count,
        total_markets: options.len(),
        top_options: options.iter().take(TOP_OPTIONS_LIMIT).cloned().collect(),
    };

    Ok(RecommendationReport {
        commodity: commodity.to_string(),
        quantity,
        recommendation,
        best: Pick::new(top),
        nearest: Pick::new(nearest),
        summary,
        min_quantity_for_profit,
    })
}
