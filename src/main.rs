use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use mandi_advisor::{
    domain::{Coordinate, RankedOption, WeatherSignal},
    infra::{
        location::{FixedLocation, IpLocationProvider, LocationProvider},
        prices::{PriceSource, StaticPriceSource, SyntheticPriceSource},
    },
    util::{
        logging::{init_logging, LogFormat},
        persistence::save_user_config,
        version::{version_label, APP_NAME},
    },
    Advice, Advisor, AdvisorConfig,
};

#[derive(Parser, Debug)]
#[command(name = "mandi-advisor", version = version_label(), about)]
struct Cli {
    /// Configuration file with markets and tariffs.
    #[arg(long, global = true, env = "MANDI_ADVISOR_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List known commodities.
    Commodities,
    /// Rank markets by net profit after transport.
    Rank(QueryArgs),
    /// Recommend where and when to sell.
    Recommend {
        #[command(flatten)]
        query: QueryArgs,
        /// Rain is forecast for the coming days.
        #[arg(long)]
        rain: bool,
    },
    /// Write the built-in configuration to the user config directory.
    InitConfig {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct QueryArgs {
    #[arg(long)]
    commodity: String,

    /// Quantity in kg.
    #[arg(long)]
    quantity: f64,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Seed for the synthetic price generator.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with fixed prices per mandi instead of generated ones.
    #[arg(long, conflicts_with = "seed")]
    quotes: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);
    tracing::debug!(app = APP_NAME, version = %version_label(), "starting");

    if let Command::InitConfig { force } = cli.command {
        let text = mandi_advisor::config::embedded_text()?;
        let path = save_user_config(&text, force)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config =
        Arc::new(AdvisorConfig::load(cli.config.as_deref()).context("loading configuration")?);

    match cli.command {
        Command::Commodities => {
            for name in config.commodity_names() {
                println!("{name}");
            }
        }
        Command::Rank(query) => {
            let advisor = build_advisor(config, &query)?;
            let options = advisor
                .rank_markets(&query.commodity, query.quantity)
                .await?;
            if query.json {
                println!("{}", serde_json::to_string_pretty(&options)?);
            } else if options.is_empty() {
                println!("No markets quoted a price for {}.", query.commodity);
            } else {
                print_options(&options);
            }
        }
        Command::Recommend { query, rain } => {
            let advisor = build_advisor(config, &query)?;
            let weather = rain.then_some(WeatherSignal {
                rain_forecast: true,
            });
            let advice = advisor
                .recommend(&query.commodity, query.quantity, weather)
                .await?;
            if query.json {
                println!("{}", serde_json::to_string_pretty(&advice)?);
            } else {
                print_advice(&advice);
            }
        }
        Command::InitConfig { .. } => {}
    }

    Ok(())
}

fn build_advisor(config: Arc<AdvisorConfig>, query: &QueryArgs) -> anyhow::Result<Advisor> {
    let prices: Arc<dyn PriceSource> = match &query.quotes {
        Some(path) => {
            let source = StaticPriceSource::from_path(path)
                .with_context(|| format!("loading quotes from {}", path.display()))?;
            Arc::new(source)
        }
        None => Arc::new(SyntheticPriceSource::from_config(&config, query.seed)),
    };

    let location: Arc<dyn LocationProvider> = match (query.lat, query.lon) {
        (Some(lat), Some(lon)) => Arc::new(FixedLocation(Coordinate::new(lat, lon))),
        _ => Arc::new(IpLocationProvider::with_endpoint(&config.location_endpoint)?),
    };

    Ok(Advisor::new(config, prices, location))
}

fn print_options(options: &[RankedOption]) {
    println!(
        "{:>3}  {:<34} {:<15} {:>8} {:>9} {:<6} {:>7} {:>10} {:>11}",
        "#", "Mandi", "Type", "km", "Rs/kg", "Demand", "Vehicle", "Transport", "Net profit"
    );
    for (rank, option) in options.iter().enumerate() {
        println!(
            "{:>3}  {:<34} {:<15} {:>8.1} {:>9.2} {:<6} {:>7} {:>10.0} {:>11.0}{}",
            rank + 1,
            option.mandi.display_name(),
            option.mandi.kind.label(),
            option.distance,
            option.price(),
            option.quote.demand_level.label(),
            option.transport.vehicle_class,
            option.transport.total_fare,
            option.net_profit,
            if option.is_profitable { "" } else { "  (loss)" }
        );
    }
}

fn print_advice(advice: &Advice) {
    let report = &advice.report;
    let rec = &report.recommendation;

    println!(
        "{} {} kg of {}  [urgency: {}]",
        rec.action, report.quantity, report.commodity, rec.urgency
    );
    println!("  {}", rec.reason);
    if let Some(warning) = &rec.warning {
        println!("  Warning: {warning}");
    }
    if let Some(note) = &rec.weather_advice {
        println!("  Weather: {note}");
    }
    if let Some(min) = report.min_quantity_for_profit {
        println!("  Estimated break-even quantity: about {min} kg");
    }

    let best = &report.best.option;
    let nearest = &report.nearest.option;
    println!();
    println!(
        "Best market:    {} ({:.1} km, Rs {:.0} net)",
        best.mandi.display_name(),
        best.distance,
        best.net_profit
    );
    println!(
        "Nearest market: {} ({:.1} km, Rs {:.0} net)",
        nearest.mandi.display_name(),
        nearest.distance,
        nearest.net_profit
    );
    println!(
        "Average price Rs {:.2}/kg, {} of {} markets profitable, transport spread Rs {:.0}",
        report.summary.average_price,
        report.summary.profitable_count,
        report.summary.total_markets,
        report.summary.transport_cost_spread
    );
    println!();
    print_options(&report.summary.top_options);
}
