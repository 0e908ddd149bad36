use alloy::primitives::U256;
use clap::Parser;
use dex_toolkit::{logging, sqrt_price_x96_to_price, tick_math::get_tick_at_sqrt_ratio, PoolPrice};
use eyre::Result;

/// Decodes a `slot0().sqrtPriceX96` into an exact price.
#[derive(Parser)]
struct Cli {
    sqrt_price_x96: U256,
    /// Fractional digits to print
    #[arg(short, long, default_value_t = 18)]
    precision: usize,
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let report = match sqrt_price_x96_to_price(cli.sqrt_price_x96) {
        PoolPrice::Uninitialized => serde_json::json!({
            "sqrt_price_x96": cli.sqrt_price_x96.to_string(),
            "initialized": false,
        }),
        PoolPrice::Initialized(price) => serde_json::json!({
            "sqrt_price_x96": cli.sqrt_price_x96.to_string(),
            "initialized": true,
            "price": price.to_decimal_string(cli.precision),
            "inverse_price": price.invert()?.to_decimal_string(cli.precision),
            "tick": get_tick_at_sqrt_ratio(cli.sqrt_price_x96)?,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
