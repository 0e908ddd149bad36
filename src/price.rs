use std::{cmp::Ordering, fmt};

use alloy::primitives::{U160, U256};
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

use crate::{error::TickMathError, tick_math};

/// An exact, non-negative rational price.
#[derive(Debug, Clone)]
pub struct Price {
    numerator: BigUint,
    denominator: BigUint,
}

impl Price {
    pub fn one() -> Self {
        Price {
            numerator: BigUint::one(),
            denominator: BigUint::one(),
        }
    }

    pub fn numerator(&self) -> &BigUint {
        &self.numerator
    }

    pub fn denominator(&self) -> &BigUint {
        &self.denominator
    }

    /// The reciprocal price, i.e. token0 per token1 for a pool price.
    pub fn invert(&self) -> Result<Price, TickMathError> {
        if self.numerator.is_zero() {
            return Err(TickMathError::NonPositivePrice);
        }
        Ok(Price {
            numerator: self.denominator.clone(),
            denominator: self.numerator.clone(),
        })
    }

    /// Lossy conversion for display and for feeding `price_to_tick`.
    pub fn to_f64(&self) -> f64 {
        let (Some(n), Some(d)) = (self.numerator.to_f64(), self.denominator.to_f64()) else {
            return f64::NAN;
        };
        n / d
    }

    /// Decimal expansion truncated to `places` fractional digits.
    pub fn to_decimal_string(&self, places: usize) -> String {
        let integer = &self.numerator / &self.denominator;
        if places == 0 {
            return integer.to_string();
        }
        let remainder = &self.numerator % &self.denominator;
        let scale = BigUint::from(10u32).pow(places as u32);
        let fraction = remainder * scale / &self.denominator;
        format!("{integer}.{fraction:0>places$}")
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.numerator * &other.denominator).cmp(&(&other.numerator * &self.denominator))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string(f.precision().unwrap_or(18)))
    }
}

/// Price state decoded from a pool's `sqrtPriceX96`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolPrice {
    /// `sqrtPriceX96 == 0`, the pool was never initialized.
    Uninitialized,
    /// token1 per token0
    Initialized(Price),
}

impl PoolPrice {
    pub fn price(&self) -> Result<&Price, TickMathError> {
        match self {
            PoolPrice::Uninitialized => Err(TickMathError::PoolUninitialized),
            PoolPrice::Initialized(price) => Ok(price),
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self, PoolPrice::Initialized(_))
    }
}

pub(crate) fn u256_to_biguint(value: U256) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes::<32>())
}

/// `(sqrtPriceX96 / 2^96)^2` as an exact rational.
pub fn sqrt_price_x96_to_price(sqrt_price_x96: U256) -> PoolPrice {
    if sqrt_price_x96.is_zero() {
        return PoolPrice::Uninitialized;
    }
    let sqrt = u256_to_biguint(sqrt_price_x96);
    PoolPrice::Initialized(Price {
        numerator: &sqrt * &sqrt,
        denominator: BigUint::one() << 192,
    })
}

/// A `slot0` snapshot. Re-read it when freshness matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub sqrt_price_x96: U160,
    pub tick: i32,
}

impl PriceQuote {
    pub fn new(sqrt_price_x96: U160, tick: i32) -> Self {
        PriceQuote { sqrt_price_x96, tick }
    }

    pub fn is_initialized(&self) -> bool {
        !self.sqrt_price_x96.is_zero()
    }

    /// token1 per token0
    pub fn price(&self) -> PoolPrice {
        sqrt_price_x96_to_price(U256::from(self.sqrt_price_x96))
    }

    /// token0 per token1
    pub fn inverse_price(&self) -> Result<Price, TickMathError> {
        self.price().price()?.invert()
    }

    /// Tick implied by the sqrt price, which can differ from the stored tick
    /// by one right at a boundary crossing.
    pub fn implied_tick(&self) -> Result<i32, TickMathError> {
        if !self.is_initialized() {
            return Err(TickMathError::PoolUninitialized);
        }
        tick_math::get_tick_at_sqrt_ratio(U256::from(self.sqrt_price_x96))
    }
}
