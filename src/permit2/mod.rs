//! Permit2 AllowanceTransfer: typed-data signing and the approval flow that
//! takes an owner from a bare ERC-20 balance to a live Permit2 allowance.

pub mod flow;
pub mod signer;

use std::time::Duration;

use alloy::primitives::{aliases::U48, U160, U256};

pub use crate::config::PERMIT2_ADDRESS;
pub use flow::{
    authorize, check_permit, ensure_permit, NonceSource, Permit2Allowance, PermitChain,
    PermitFailure, PermitOutcome, PermitRequest, PermitState, PermitStatus,
};
pub use signer::{permit2_domain, Deadlines, Permit2Signer, SignedPermit, TokenPermit};

/// `type(uint160).max`
pub const MAX_ALLOWANCE_TRANSFER_AMOUNT: U160 = U160::MAX;
/// `type(uint48).max`
pub const MAX_ALLOWANCE_EXPIRATION: U48 = U48::MAX;
/// `type(uint256).max`
pub const MAX_SIG_DEADLINE: U256 = U256::MAX;

/// Default lifetime of the allowance granted by a permit.
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);
/// Default lifetime of the permit signature itself.
pub const DEFAULT_SIG_DEADLINE: Duration = Duration::from_secs(30 * 24 * 60 * 60);
