use std::time::Duration;

use alloy::primitives::{B256, U256};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickMathError {
    #[error("tick {0} is outside [-887272, 887272]")]
    TickOutOfBounds(i32),
    #[error("price must be strictly positive")]
    NonPositivePrice,
    #[error("price is outside the range covered by ticks")]
    PriceOutOfRange,
    #[error("tick spacing must be positive, got {0}")]
    NonPositiveSpacing(i32),
    #[error("percent band must be strictly positive")]
    NonPositivePercent,
    #[error("target ratio must be strictly positive")]
    NonPositiveRatio,
    #[error("spacing multiple must be positive, got {0}")]
    NonPositiveMultiple(i32),
    #[error("sqrt price outside [MIN_SQRT_RATIO, MAX_SQRT_RATIO)")]
    SqrtPriceOutOfBounds,
    #[error("price limit must be below 10000 bps when moving the price down")]
    InvalidLimitFactor,
    #[error("pool is uninitialized (sqrtPriceX96 == 0)")]
    PoolUninitialized,
    #[error("range [{lower}, {upper}] is empty")]
    EmptyRange { lower: i32, upper: i32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("chain unavailable: {0}")]
    Unavailable(String),
    #[error("no receipt for {tx_hash} after {waited:?}")]
    TimedOut { tx_hash: B256, waited: Duration },
    #[error("contract call failed: {0}")]
    Contract(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Permit2Error {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("ERC-20 approval of Permit2 failed in tx {tx_hash:?}")]
    Erc20ApprovalFailed { tx_hash: Option<B256> },
    #[error("permit transaction failed in tx {tx_hash:?}")]
    PermitTxFailed { tx_hash: Option<B256> },
    #[error("nonce {signed} was consumed before submission, current nonce is {current}")]
    StaleNonce { signed: u64, current: u64 },
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("amount {0} does not fit in uint160")]
    AmountOverflow(U256),
    #[error("permit batch needs at least one token")]
    EmptyBatch,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError<E> {
    #[error("no viable candidate after {attempts} attempts, last error: {last_error:?}")]
    NoViableCandidate {
        attempts: usize,
        last_error: Option<E>,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
    #[error("no chain config for chain id {0}")]
    UnknownChain(u64),
    #[error("no tick spacing known for fee tier {0}")]
    UnknownFeeTier(u32),
}
