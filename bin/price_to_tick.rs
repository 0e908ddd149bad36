use clap::Parser;
use dex_toolkit::{logging, price_to_tick, round_to_tick_spacing, tick_math::get_sqrt_ratio_at_tick, tick_to_price, RoundDirection};
use eyre::Result;

/// Converts a human price (token1 per token0) into a pool tick.
#[derive(Parser)]
struct Cli {
    price: f64,
    /// Also round the tick onto this spacing grid
    #[arg(short, long)]
    spacing: Option<i32>,
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let tick = price_to_tick(cli.price)?;
    let mut report = serde_json::json!({
        "price": cli.price,
        "tick": tick,
        "tick_price": tick_to_price(tick)?,
        "sqrt_price_x96": get_sqrt_ratio_at_tick(tick)?.to_string(),
    });
    if let Some(spacing) = cli.spacing {
        let down = round_to_tick_spacing(tick, spacing, RoundDirection::Down)?;
        let up = round_to_tick_spacing(tick, spacing, RoundDirection::Up)?;
        report["spacing"] = spacing.into();
        report["rounded_down"] = down.into();
        report["rounded_up"] = up.into();
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
