//! ABI bindings for the contracts the scripts talk to.
//!
//! These are the single encode/decode boundary: everything else works with
//! the typed structs generated here.

alloy::sol! {

/// @notice The permit data for a token
#[derive(Debug, PartialEq, Eq)]
struct PermitDetails {
    // ERC20 token address
    address token;
    // the maximum amount allowed to spend
    uint160 amount;
    // timestamp at which a spender's token allowances become invalid
    uint48 expiration;
    // an incrementing value indexed per owner,token,and spender for each signature
    uint48 nonce;
}

/// @notice The permit message signed for a single token allowance
#[derive(Debug, PartialEq, Eq)]
struct PermitSingle {
    // the permit data for a single token allowance
    PermitDetails details;
    // address permissioned on the allowed tokens
    address spender;
    // deadline on the permit signature
    uint256 sigDeadline;
}

/// @notice The permit message signed for multiple token allowances
#[derive(Debug, PartialEq, Eq)]
struct PermitBatch {
    // the permit data for multiple token allowances
    PermitDetails[] details;
    // address permissioned on the allowed tokens
    address spender;
    // deadline on the permit signature
    uint256 sigDeadline;
}

#[sol(rpc)]
interface IERC20 {
    function allowance(address owner, address spender) external view returns (uint256);
    function balanceOf(address owner) external view returns (uint256);
    function approve(address spender, uint256 amount) external returns (bool);
}

/// @notice Permit2 AllowanceTransfer, plus the owner-wide `nonces` view some
/// deployments expose instead of per (token, spender) nonces.
#[derive(Debug, PartialEq, Eq)]
#[sol(rpc)]
interface IPermit2 {
    function allowance(address user, address token, address spender) external view returns (uint160 amount, uint48 expiration, uint48 nonce);
    function nonces(address owner) external view returns (uint48);
    function permit(address owner, PermitSingle memory permitSingle, bytes calldata signature) external;
    function permit(address owner, PermitBatch memory permitBatch, bytes calldata signature) external;
}

#[derive(Debug, PartialEq, Eq)]
#[sol(rpc)]
interface IUniswapV3Pool {
    function slot0()
        external
        view
        returns (
            uint160 sqrtPriceX96,
            int24 tick,
            uint16 observationIndex,
            uint16 observationCardinality,
            uint16 observationCardinalityNext,
            uint8 feeProtocol,
            bool unlocked
        );

    function ticks(int24 tick)
        external
        view
        returns (
            uint128 liquidityGross,
            int128 liquidityNet,
            uint256 feeGrowthOutside0X128,
            uint256 feeGrowthOutside1X128,
            int56 tickCumulativeOutside,
            uint160 secondsPerLiquidityOutsideX128,
            uint32 secondsOutside,
            bool initialized
        );

    function liquidity() external view returns (uint128);

    /// @notice The first of the two tokens of the pool, sorted by address
    function token0() external view returns (address);

    /// @notice The second of the two tokens of the pool, sorted by address
    function token1() external view returns (address);

    /// @notice The pool's fee in hundredths of a bip, i.e. 1e-6
    function fee() external view returns (uint24);

    /// @notice The pool tick spacing
    /// @dev Ticks can only be used at multiples of this value, minimum of 1 and always positive
    function tickSpacing() external view returns (int24);
}
}
