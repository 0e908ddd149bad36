pub mod candidates;
pub mod config;
pub mod error;
pub mod logging;
pub mod permit2;
pub mod price;
pub mod rpc;
pub mod sol_types;
pub mod tick;
pub mod tick_math;
pub mod tick_range;

pub use error::{ChainError, ConfigError, Permit2Error, SearchError, TickMathError};
pub use price::{sqrt_price_x96_to_price, PoolPrice, Price, PriceQuote};
pub use tick_math::{price_to_tick, tick_to_price, MAX_TICK, MIN_TICK};
pub use tick_range::{
    compute_range_for_percent_band, compute_range_for_ratio, round_to_tick_spacing,
    RoundDirection, TickRange,
};
