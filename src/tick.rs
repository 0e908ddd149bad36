use crate::sol_types::IUniswapV3Pool::ticksReturn;

/// The part of a pool's `ticks(tick)` record used when choosing ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    pub tick: i32,
    // the total position liquidity that references this tick
    pub liquidity_gross: u128,
    // amount of net liquidity added (subtracted) when tick is crossed from left to right (right to left)
    pub liquidity_net: i128,
    // true iff liquidity_gross != 0
    pub initialized: bool,
}

impl TickInfo {
    pub fn from_return(tick: i32, value: &ticksReturn) -> Self {
        TickInfo {
            tick,
            liquidity_gross: value.liquidityGross,
            liquidity_net: value.liquidityNet,
            initialized: value.initialized,
        }
    }
}

/// Ticks of `infos` that hold liquidity, sorted ascending.
pub fn initialized_ticks(infos: &[TickInfo]) -> Vec<i32> {
    let mut ticks: Vec<i32> = infos
        .iter()
        .filter(|info| info.initialized)
        .map(|info| info.tick)
        .collect();
    ticks.sort_unstable();
    ticks
}
