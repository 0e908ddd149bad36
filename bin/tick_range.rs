use clap::{Parser, Subcommand};
use dex_toolkit::{
    candidates::{range_candidates, DEFAULT_BAND_PERCENTS},
    compute_range_for_percent_band, compute_range_for_ratio,
    config::{ChainConfig, DEFAULT_CHAIN_ID},
    logging,
    tick_to_price, TickRange,
};
use eyre::{eyre, Result};

/// Picks a liquidity range around a pool's current tick.
#[derive(Parser)]
struct Cli {
    #[arg(short, long, allow_negative_numbers = true)]
    tick: i32,
    /// Tick spacing; alternatively give --fee
    #[arg(short, long)]
    spacing: Option<i32>,
    /// Fee tier in hundredths of a bip, resolved through the chain config
    #[arg(short, long)]
    fee: Option<u32>,
    #[arg(long, default_value_t = DEFAULT_CHAIN_ID)]
    chain_id: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// ±percent around the current tick
    Band {
        #[arg(short, long)]
        percent: f64,
    },
    /// `multiple` spacings either side, checked against a target price
    Ratio {
        #[arg(long)]
        target: f64,
        #[arg(long, default_value_t = 10)]
        multiple: i32,
    },
    /// Narrow to full-range fallbacks, in the order they would be tried
    Candidates {
        #[arg(short, long, value_delimiter = ',')]
        percents: Option<Vec<f64>>,
    },
}

fn describe(range: &TickRange) -> Result<serde_json::Value> {
    Ok(serde_json::json!({
        "lower": range.lower(),
        "upper": range.upper(),
        "lower_price": tick_to_price(range.lower())?,
        "upper_price": tick_to_price(range.upper())?,
    }))
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let spacing = match (cli.spacing, cli.fee) {
        (Some(spacing), _) => spacing,
        (None, Some(fee)) => ChainConfig::for_chain(cli.chain_id)?.tick_spacing(fee)?,
        (None, None) => return Err(eyre!("either --spacing or --fee is required")),
    };

    let report = match cli.command {
        Command::Band { percent } => {
            describe(&compute_range_for_percent_band(cli.tick, spacing, percent)?)?
        }
        Command::Ratio { target, multiple } => {
            describe(&compute_range_for_ratio(cli.tick, spacing, target, multiple)?)?
        }
        Command::Candidates { percents } => {
            let percents = percents.unwrap_or_else(|| DEFAULT_BAND_PERCENTS.to_vec());
            let candidates = range_candidates(cli.tick, spacing, &percents)?;
            serde_json::to_value(candidates)?
        }
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
