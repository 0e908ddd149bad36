//! Conversions between ticks, Q64.96 sqrt prices and human prices.
//!
//! The exact conversions (`get_sqrt_ratio_at_tick`, `get_tick_at_sqrt_ratio`)
//! reproduce the pool contract's own arithmetic bit for bit. The float
//! conversions (`tick_to_price`, `price_to_tick`) are for picking ranges from
//! human prices, where `1.0001^tick` is all that is needed.

use alloy::primitives::{uint, U256};

use crate::error::TickMathError;

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = -MIN_TICK;

/// sqrt ratio at `MIN_TICK`
pub const MIN_SQRT_RATIO: U256 = uint!(4295128739_U256);
/// sqrt ratio at `MAX_TICK`
pub const MAX_SQRT_RATIO: U256 = uint!(1461446703485210103287273052203988822378723970342_U256);

/// 2^96, the fixed point one of a Q64.96 number
pub const Q96: U256 = uint!(0x1000000000000000000000000_U256);

const TICK_BASE: f64 = 1.0001;

// sqrt(1.0001^-2^i) in Q128.128 for i = 1..=19; i = 0 seeds the ratio below.
const RATIO_FACTORS: [U256; 19] = [
    uint!(0xfff97272373d413259a46990580e213a_U256),
    uint!(0xfff2e50f5f656932ef12357cf3c7fdcc_U256),
    uint!(0xffe5caca7e10e4e61c3624eaa0941cd0_U256),
    uint!(0xffcb9843d60f6159c9db58835c926644_U256),
    uint!(0xff973b41fa98c081472e6896dfb254c0_U256),
    uint!(0xff2ea16466c96a3843ec78b326b52861_U256),
    uint!(0xfe5dee046a99a2a811c461f1969c3053_U256),
    uint!(0xfcbe86c7900a88aedcffc83b479aa3a4_U256),
    uint!(0xf987a7253ac413176f2b074cf7815e54_U256),
    uint!(0xf3392b0822b70005940c7a398e4b70f3_U256),
    uint!(0xe7159475a2c29b7443b29c7fa6e889d9_U256),
    uint!(0xd097f3bdfd2022b8845ad8f792aa5825_U256),
    uint!(0xa9f746462d870fdf8a65dc1f90e061e5_U256),
    uint!(0x70d869a156d2a1b890bb3df62baf32f7_U256),
    uint!(0x31be135f97d08fd981231505542fcfa6_U256),
    uint!(0x9aa508b5b7a84e1c677de54f3e99bc9_U256),
    uint!(0x5d6af8dedb81196699c329225ee604_U256),
    uint!(0x2216e584f5fa1ea926041bedfe98_U256),
    uint!(0x48a170391f7dc42444e8fa2_U256),
];

pub fn check_tick(tick: i32) -> Result<i32, TickMathError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(TickMathError::TickOutOfBounds(tick));
    }
    Ok(tick)
}

/// Calculates sqrt(1.0001^tick) * 2^96, rounded up like the pool contract does.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, TickMathError> {
    check_tick(tick)?;
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        uint!(0xfffcb933bd6fad37aa2d162d1a594001_U256)
    } else {
        U256::from(1) << 128
    };
    for (i, factor) in RATIO_FACTORS.iter().enumerate() {
        if abs_tick & (1 << (i + 1)) != 0 {
            ratio = (ratio * factor) >> 128;
        }
    }
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up
    let rounding = if ratio % (U256::from(1) << 32) == U256::ZERO {
        U256::ZERO
    } else {
        U256::from(1)
    };
    Ok((ratio >> 32) + rounding)
}

/// Greatest tick whose sqrt ratio is `<= sqrt_price_x96`.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, TickMathError> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(TickMathError::SqrtPriceOutOfBounds);
    }
    let mut lo = MIN_TICK;
    let mut hi = MAX_TICK;
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if get_sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(lo)
}

/// `1.0001^tick`, the price of token0 in units of token1.
pub fn tick_to_price(tick: i32) -> Result<f64, TickMathError> {
    check_tick(tick)?;
    Ok(raw_price(tick))
}

fn raw_price(tick: i32) -> f64 {
    TICK_BASE.powf(tick as f64)
}

/// `floor(log(price) / log(1.0001))`.
///
/// The float quotient is corrected by one step against `tick_to_price` so that
/// `price_to_tick(tick_to_price(t)) == t` for every valid tick.
pub fn price_to_tick(price: f64) -> Result<i32, TickMathError> {
    if price.is_nan() || price <= 0.0 {
        return Err(TickMathError::NonPositivePrice);
    }
    let estimate = (price.ln() / TICK_BASE.ln()).floor();
    if !estimate.is_finite() || estimate < (MIN_TICK - 1) as f64 || estimate > (MAX_TICK + 1) as f64 {
        return Err(TickMathError::PriceOutOfRange);
    }

    let mut tick = estimate as i32;
    if raw_price(tick + 1) <= price {
        tick += 1;
    } else if raw_price(tick) > price {
        tick -= 1;
    }
    check_tick(tick)
}

/// Moves `current` by `limit_bps` basis points in the swap direction, clamped
/// strictly inside the sqrt ratio bounds.
///
/// Selling token0 (`zero_for_one`) pushes the price down, so the limit is
/// `current * (1 - bps/10_000)`; otherwise it is `current * (1 + bps/10_000)`.
pub fn sqrt_price_limit(
    current: U256,
    limit_bps: u32,
    zero_for_one: bool,
) -> Result<U256, TickMathError> {
    if current < MIN_SQRT_RATIO || current >= MAX_SQRT_RATIO {
        return Err(TickMathError::SqrtPriceOutOfBounds);
    }
    let scale = U256::from(10_000u32);
    let limit = if zero_for_one {
        if limit_bps >= 10_000 {
            return Err(TickMathError::InvalidLimitFactor);
        }
        current * (scale - U256::from(limit_bps)) / scale
    } else {
        current * (scale + U256::from(limit_bps)) / scale
    };

    let floor = MIN_SQRT_RATIO + U256::from(1);
    let ceiling = MAX_SQRT_RATIO - U256::from(1);
    Ok(limit.clamp(floor, ceiling))
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sqrt_ratio_at_bounds() -> eyre::Result<()> {
        assert_eq!(get_sqrt_ratio_at_tick(MIN_TICK)?, MIN_SQRT_RATIO);
        assert_eq!(get_sqrt_ratio_at_tick(MAX_TICK)?, MAX_SQRT_RATIO);
        assert_eq!(get_sqrt_ratio_at_tick(0)?, Q96);
        Ok(())
    }

    #[test]
    fn sqrt_ratio_rejects_out_of_range_ticks() {
        assert_eq!(
            get_sqrt_ratio_at_tick(MAX_TICK + 1),
            Err(TickMathError::TickOutOfBounds(MAX_TICK + 1))
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(MIN_TICK - 1),
            Err(TickMathError::TickOutOfBounds(MIN_TICK - 1))
        );
    }

    #[test]
    fn tick_at_sqrt_ratio_bounds() -> eyre::Result<()> {
        assert_eq!(get_tick_at_sqrt_ratio(MIN_SQRT_RATIO)?, MIN_TICK);
        assert_eq!(get_tick_at_sqrt_ratio(MAX_SQRT_RATIO - U256::from(1))?, MAX_TICK - 1);
        assert_eq!(get_tick_at_sqrt_ratio(Q96)?, 0);
        assert!(get_tick_at_sqrt_ratio(MAX_SQRT_RATIO).is_err());
        assert!(get_tick_at_sqrt_ratio(MIN_SQRT_RATIO - U256::from(1)).is_err());
        Ok(())
    }

    #[test]
    fn tick_at_sqrt_ratio_between_ticks() -> eyre::Result<()> {
        let a = get_sqrt_ratio_at_tick(1)?;
        let b = get_sqrt_ratio_at_tick(2)?;
        let mid = (a + b) / U256::from(2);
        assert_eq!(get_tick_at_sqrt_ratio(mid)?, 1);
        Ok(())
    }

    #[test]
    fn price_at_tick_zero_is_one() -> eyre::Result<()> {
        assert_eq!(tick_to_price(0)?, 1.0);
        assert_eq!(price_to_tick(1.0)?, 0);
        Ok(())
    }

    #[test]
    fn non_positive_prices_are_rejected() {
        assert_eq!(price_to_tick(0.0), Err(TickMathError::NonPositivePrice));
        assert_eq!(price_to_tick(-3.5), Err(TickMathError::NonPositivePrice));
        assert_eq!(price_to_tick(f64::NAN), Err(TickMathError::NonPositivePrice));
    }

    #[test]
    fn price_to_tick_floors() -> eyre::Result<()> {
        let between = (tick_to_price(100)? + tick_to_price(101)?) / 2.0;
        assert_eq!(price_to_tick(between)?, 100);
        let below_one = (tick_to_price(-1)? + 1.0) / 2.0;
        assert_eq!(price_to_tick(below_one)?, -1);
        Ok(())
    }

    #[test]
    fn tick_to_price_rejects_out_of_range() {
        assert!(tick_to_price(MAX_TICK + 1).is_err());
        assert_eq!(price_to_tick(f64::MAX), Err(TickMathError::PriceOutOfRange));
        assert_eq!(price_to_tick(1e-60), Err(TickMathError::PriceOutOfRange));
        assert_eq!(price_to_tick(f64::INFINITY), Err(TickMathError::PriceOutOfRange));
    }

    #[test]
    fn price_limit_moves_in_swap_direction() -> eyre::Result<()> {
        let down = sqrt_price_limit(Q96, 5_000, true)?;
        assert_eq!(down, Q96 / U256::from(2));
        let up = sqrt_price_limit(Q96, 5_000, false)?;
        assert_eq!(up, Q96 * U256::from(3) / U256::from(2));
        Ok(())
    }

    #[test]
    fn price_limit_is_clamped() -> eyre::Result<()> {
        let near_max = MAX_SQRT_RATIO - U256::from(10);
        assert_eq!(sqrt_price_limit(near_max, 100, false)?, MAX_SQRT_RATIO - U256::from(1));
        assert_eq!(sqrt_price_limit(MIN_SQRT_RATIO, 9_999, true)?, MIN_SQRT_RATIO + U256::from(1));
        assert_eq!(sqrt_price_limit(Q96, 10_000, true), Err(TickMathError::InvalidLimitFactor));
        Ok(())
    }

    proptest! {
        #[test]
        fn price_tick_round_trip(tick in MIN_TICK..=MAX_TICK) {
            let price = tick_to_price(tick).unwrap();
            prop_assert_eq!(price_to_tick(price).unwrap(), tick);
        }

        #[test]
        fn sqrt_ratio_round_trip(tick in MIN_TICK..MAX_TICK) {
            let ratio = get_sqrt_ratio_at_tick(tick).unwrap();
            prop_assert_eq!(get_tick_at_sqrt_ratio(ratio).unwrap(), tick);
        }
    }
}
