use std::{str::FromStr, time::Duration};

use alloy::{
    primitives::{address, Address},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use tracing::debug;

use crate::error::ConfigError;

/// Canonical Permit2 deployment, the same address on every chain below.
pub const PERMIT2_ADDRESS: Address = address!("000000000022D473030F116dDEE9F6B43aC78BA3");

/// fee tier (hundredths of a bip) -> tick spacing
pub const DEFAULT_FEE_TIER_SPACINGS: &[(u32, i32)] = &[(100, 1), (500, 10), (3000, 60), (10000, 200)];

pub const DEFAULT_CHAIN_ID: u64 = 100;
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

const KNOWN_CHAINS: &[(u64, &str)] = &[
    (1, "ethereum"),
    (10, "optimism"),
    (100, "gnosis"),
    (137, "polygon"),
    (8453, "base"),
    (42161, "arbitrum"),
];

/// Per-deployment constants, injected wherever a contract address or a fee
/// tier spacing is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: &'static str,
    pub permit2: Address,
    pub fee_tier_spacings: Vec<(u32, i32)>,
    pub confirmation_timeout: Duration,
}

impl ChainConfig {
    pub fn for_chain(chain_id: u64) -> Result<Self, ConfigError> {
        let (_, name) = KNOWN_CHAINS
            .iter()
            .find(|(id, _)| *id == chain_id)
            .ok_or(ConfigError::UnknownChain(chain_id))?;
        Ok(ChainConfig {
            chain_id,
            name,
            permit2: PERMIT2_ADDRESS,
            fee_tier_spacings: DEFAULT_FEE_TIER_SPACINGS.to_vec(),
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        })
    }

    pub fn with_permit2(mut self, permit2: Address) -> Self {
        self.permit2 = permit2;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Spacing for a fee tier. Unknown tiers are an error, not a guess.
    pub fn tick_spacing(&self, fee: u32) -> Result<i32, ConfigError> {
        self.fee_tier_spacings
            .iter()
            .find(|(tier, _)| *tier == fee)
            .map(|(_, spacing)| *spacing)
            .ok_or(ConfigError::UnknownFeeTier(fee))
    }
}

/// Process configuration read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_url: Url,
    pub chain: ChainConfig,
    signer: Option<PrivateKeySigner>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let rpc_url = lookup("RPC_URL").ok_or(ConfigError::MissingVar("RPC_URL"))?;
        let rpc_url = Url::parse(&rpc_url).map_err(|_| ConfigError::InvalidVar {
            name: "RPC_URL",
            value: rpc_url.clone(),
        })?;

        let chain_id = match lookup("CHAIN_ID") {
            Some(value) => parse_var("CHAIN_ID", &value)?,
            None => DEFAULT_CHAIN_ID,
        };
        let mut chain = ChainConfig::for_chain(chain_id)?;
        if let Some(value) = lookup("PERMIT2_ADDRESS") {
            chain = chain.with_permit2(parse_var("PERMIT2_ADDRESS", &value)?);
        }
        if let Some(value) = lookup("CONFIRMATION_TIMEOUT_SECS") {
            let secs: u64 = parse_var("CONFIRMATION_TIMEOUT_SECS", &value)?;
            chain = chain.with_confirmation_timeout(Duration::from_secs(secs));
        }

        let signer = match lookup("PRIVATE_KEY") {
            Some(key) => Some(PrivateKeySigner::from_str(key.trim()).map_err(|_| {
                ConfigError::InvalidVar {
                    name: "PRIVATE_KEY",
                    value: "<redacted>".to_string(),
                }
            })?),
            None => None,
        };

        Ok(Settings {
            rpc_url,
            chain,
            signer,
        })
    }

    /// The owner key; only commands that send transactions need it.
    pub fn signer(&self) -> Result<&PrivateKeySigner, ConfigError> {
        self.signer.as_ref().ok_or(ConfigError::MissingVar("PRIVATE_KEY"))
    }
}

fn parse_var<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        name,
        value: value.to_string(),
    })
}
