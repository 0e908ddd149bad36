use alloy::primitives::Address;
use clap::Parser;
use dex_toolkit::{
    compute_range_for_percent_band,
    config::Settings,
    logging,
    rpc::{connect_read_only, read_pool, read_ticks},
    tick::initialized_ticks,
};
use eyre::Result;
use tracing::info;

/// Reads a Uniswap V3 pool's price, and optionally a range around it.
#[derive(Parser)]
struct Cli {
    pool: Address,
    /// Suggest a ±percent range around the current tick
    #[arg(short, long)]
    percent: Option<f64>,
    #[arg(long, default_value_t = 18)]
    precision: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let provider = connect_read_only(settings.rpc_url.clone());

    let snapshot = read_pool(&provider, cli.pool).await?;
    info!(pool = %snapshot.pool, fee = snapshot.fee, tick_spacing = snapshot.tick_spacing, "pool loaded");

    let mut report = serde_json::json!({
        "pool": snapshot.pool,
        "token0": snapshot.token0,
        "token1": snapshot.token1,
        "fee": snapshot.fee,
        "tick_spacing": snapshot.tick_spacing,
        "liquidity": snapshot.liquidity.to_string(),
        "sqrt_price_x96": snapshot.quote.sqrt_price_x96.to_string(),
        "tick": snapshot.quote.tick,
        "initialized": snapshot.quote.is_initialized(),
    });
    if !snapshot.quote.is_initialized() {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let price = snapshot.quote.price();
    let price = price.price()?;
    report["price_token1_per_token0"] = price.to_decimal_string(cli.precision).into();
    report["price_token0_per_token1"] = price.invert()?.to_decimal_string(cli.precision).into();

    if let Some(percent) = cli.percent {
        let range = compute_range_for_percent_band(snapshot.quote.tick, snapshot.tick_spacing, percent)?;
        let ticks = read_ticks(&provider, cli.pool, &[range.lower(), range.upper()]).await?;
        report["range"] = serde_json::json!({
            "percent": percent,
            "lower": range.lower(),
            "upper": range.upper(),
            "initialized_bounds": initialized_ticks(&ticks),
        });
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
