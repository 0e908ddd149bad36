use tracing::{debug, warn};

use crate::{
    error::TickMathError,
    tick_math::{check_tick, price_to_tick, MAX_TICK, MIN_TICK},
};

const TICK_BASE: f64 = 1.0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundDirection {
    Down,
    Up,
}

fn check_spacing(spacing: i32) -> Result<i32, TickMathError> {
    if spacing <= 0 {
        return Err(TickMathError::NonPositiveSpacing(spacing));
    }
    Ok(spacing)
}

/// Rounds `tick` onto the spacing grid. Works for negative ticks too:
/// `Down` is `floor(tick / spacing) * spacing`, `Up` is the ceiling.
pub fn round_to_tick_spacing(
    tick: i32,
    spacing: i32,
    direction: RoundDirection,
) -> Result<i32, TickMathError> {
    check_spacing(spacing)?;
    let (tick, spacing) = (tick as i64, spacing as i64);
    let rounded = match direction {
        RoundDirection::Down => tick.div_euclid(spacing) * spacing,
        RoundDirection::Up => -(-tick).div_euclid(spacing) * spacing,
    };
    i32::try_from(rounded).map_err(|_| TickMathError::TickOutOfBounds(tick as i32))
}

/// Lowest tick on the spacing grid that the pool accepts.
pub fn min_usable_tick(spacing: i32) -> Result<i32, TickMathError> {
    round_to_tick_spacing(MIN_TICK, spacing, RoundDirection::Up)
}

/// Highest tick on the spacing grid that the pool accepts.
pub fn max_usable_tick(spacing: i32) -> Result<i32, TickMathError> {
    round_to_tick_spacing(MAX_TICK, spacing, RoundDirection::Down)
}

/// A liquidity range: both bounds on the spacing grid and `lower < upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct TickRange {
    lower: i32,
    upper: i32,
}

impl TickRange {
    pub fn new(lower: i32, upper: i32, spacing: i32) -> Result<Self, TickMathError> {
        check_spacing(spacing)?;
        check_tick(lower)?;
        check_tick(upper)?;
        if lower >= upper || lower % spacing != 0 || upper % spacing != 0 {
            return Err(TickMathError::EmptyRange { lower, upper });
        }
        Ok(TickRange { lower, upper })
    }

    /// The widest range the pool accepts for `spacing`.
    pub fn full(spacing: i32) -> Result<Self, TickMathError> {
        let lower = min_usable_tick(spacing)?;
        let upper = max_usable_tick(spacing)?;
        TickRange::new(lower, upper, spacing)
    }

    pub fn lower(&self) -> i32 {
        self.lower
    }

    pub fn upper(&self) -> i32 {
        self.upper
    }

    pub fn width(&self) -> i32 {
        self.upper - self.lower
    }

    pub fn contains(&self, tick: i32) -> bool {
        self.lower <= tick && tick < self.upper
    }

    /// Moves each bound outward onto the nearest initialized tick, if there is
    /// one on that side. Bounds without an initialized tick beyond them stay put,
    /// and ticks off the `spacing` grid are ignored.
    pub fn snap_to_initialized(&self, initialized: &[i32], spacing: i32) -> Result<TickRange, TickMathError> {
        check_spacing(spacing)?;
        let on_grid = || initialized.iter().copied().filter(|t| t % spacing == 0);
        let lower = on_grid().filter(|t| *t <= self.lower).max().unwrap_or(self.lower);
        let upper = on_grid().filter(|t| *t >= self.upper).min().unwrap_or(self.upper);
        TickRange::new(lower, upper, spacing)
    }
}

/// Clamps `[lower, upper]` into the usable grid and widens it by one spacing
/// when both bounds landed on the same tick.
fn bounded_range(lower: i32, upper: i32, spacing: i32) -> Result<TickRange, TickMathError> {
    let min = min_usable_tick(spacing)?;
    let max = max_usable_tick(spacing)?;
    let mut lower = lower.max(min);
    let mut upper = upper.min(max);

    if lower == upper {
        if upper + spacing <= max {
            upper += spacing;
        } else if lower - spacing >= min {
            lower -= spacing;
        }
        debug!(lower, upper, spacing, "widened degenerate range by one spacing");
    }
    TickRange::new(lower, upper, spacing)
}

/// Ticks needed to move the price by `factor`, rounded to the nearest tick.
fn ticks_for_factor(factor: f64) -> i32 {
    let delta = (factor.ln() / TICK_BASE.ln()).round();
    delta.min((2 * MAX_TICK) as f64) as i32
}

/// A range covering roughly `±percent` around `current_tick`.
///
/// `delta = round(log(1 + percent/100) / log(1.0001))`, the lower bound is
/// `current - delta` rounded down and the upper `current + delta` rounded up.
pub fn compute_range_for_percent_band(
    current_tick: i32,
    spacing: i32,
    percent: f64,
) -> Result<TickRange, TickMathError> {
    check_spacing(spacing)?;
    check_tick(current_tick)?;
    if !percent.is_finite() || percent <= 0.0 {
        return Err(TickMathError::NonPositivePercent);
    }

    let delta = ticks_for_factor(1.0 + percent / 100.0);
    let lower = round_to_tick_spacing(current_tick.saturating_sub(delta), spacing, RoundDirection::Down)?;
    let upper = round_to_tick_spacing(current_tick.saturating_add(delta), spacing, RoundDirection::Up)?;
    debug!(current_tick, spacing, percent, delta, lower, upper, "percent band");

    bounded_range(lower, upper, spacing)
}

/// A range `spacing_multiple` spacings either side of `current_tick`.
///
/// The range is centred on the market, not on `target_ratio`; the target is
/// only validated and reported.
pub fn compute_range_for_ratio(
    current_tick: i32,
    spacing: i32,
    target_ratio: f64,
    spacing_multiple: i32,
) -> Result<TickRange, TickMathError> {
    check_spacing(spacing)?;
    check_tick(current_tick)?;
    if !target_ratio.is_finite() || target_ratio <= 0.0 {
        return Err(TickMathError::NonPositiveRatio);
    }
    if spacing_multiple <= 0 {
        return Err(TickMathError::NonPositiveMultiple(spacing_multiple));
    }

    let offset = spacing_multiple.saturating_mul(spacing);
    let lower = round_to_tick_spacing(current_tick.saturating_sub(offset), spacing, RoundDirection::Down)?;
    let upper = round_to_tick_spacing(current_tick.saturating_add(offset), spacing, RoundDirection::Up)?;
    let range = bounded_range(lower, upper, spacing)?;

    match price_to_tick(target_ratio) {
        Ok(target_tick) if range.contains(target_tick) => {
            debug!(target_ratio, target_tick, ?range, "target ratio inside range");
        }
        Ok(target_tick) => warn!(
            target_ratio,
            target_tick,
            current_tick,
            ?range,
            "target ratio outside range, keeping range around the current tick"
        ),
        Err(err) => warn!(
            target_ratio,
            %err,
            ?range,
            "target ratio has no tick, keeping range around the current tick"
        ),
    }
    Ok(range)
}
