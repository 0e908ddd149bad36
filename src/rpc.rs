//! Alloy-backed chain access: the production [`PermitChain`] and pool reads.

use std::time::Duration;

use alloy::{
    contract,
    network::{EthereumWallet, TransactionBuilder},
    primitives::{
        aliases::{I24, U48},
        Address, Bytes, B256, U256,
    },
    providers::{Provider, ProviderBuilder},
    rpc::types::{BlockNumberOrTag, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::{http::reqwest::Url, RpcError, TransportError},
};
use tracing::{debug, info};

use crate::{
    error::ChainError,
    permit2::{Permit2Allowance, PermitChain},
    price::PriceQuote,
    sol_types::{IPermit2, IUniswapV3Pool, IERC20},
    tick::TickInfo,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// HTTP provider that signs and fills transactions with `signer`.
pub fn connect_with_wallet(url: Url, signer: PrivateKeySigner) -> impl Provider + Clone {
    ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(url)
}

/// HTTP provider for calls only.
pub fn connect_read_only(url: Url) -> impl Provider + Clone {
    ProviderBuilder::new().connect_http(url)
}

pub(crate) fn transport_error(err: TransportError) -> ChainError {
    match err {
        RpcError::Transport(kind) => ChainError::Unavailable(kind.to_string()),
        other => ChainError::Contract(other.to_string()),
    }
}

pub(crate) fn contract_error(err: contract::Error) -> ChainError {
    match err {
        contract::Error::TransportError(err) => transport_error(err),
        other => ChainError::Contract(other.to_string()),
    }
}

pub struct AlloyChain<P> {
    provider: P,
    owner: Address,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl<P: Provider> AlloyChain<P> {
    pub fn new(provider: P, owner: Address, confirmation_timeout: Duration) -> Self {
        AlloyChain {
            provider,
            owner,
            confirmation_timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        self.provider.get_chain_id().await.map_err(transport_error)
    }
}

impl<P: Provider> PermitChain for AlloyChain<P> {
    async fn block_timestamp(&self) -> Result<u64, ChainError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(transport_error)?
            .ok_or_else(|| ChainError::Unavailable("latest block not returned".to_string()))?;
        Ok(block.header.timestamp)
    }

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        IERC20::new(token, &self.provider)
            .allowance(owner, spender)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        IERC20::new(token, &self.provider)
            .balanceOf(owner)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn permit2_allowance(
        &self,
        permit2: Address,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<Permit2Allowance, ChainError> {
        let allowance = IPermit2::new(permit2, &self.provider)
            .allowance(owner, token, spender)
            .call()
            .await
            .map_err(contract_error)?;
        Ok(Permit2Allowance {
            amount: allowance.amount,
            expiration: allowance.expiration,
            nonce: allowance.nonce,
        })
    }

    async fn permit2_owner_nonce(&self, permit2: Address, owner: Address) -> Result<U48, ChainError> {
        IPermit2::new(permit2, &self.provider)
            .nonces(owner)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn send_transaction(&self, to: Address, input: Bytes) -> Result<B256, ChainError> {
        let tx = TransactionRequest::default()
            .with_from(self.owner)
            .with_to(to)
            .with_input(input);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(transport_error)?;
        let tx_hash = *pending.tx_hash();
        info!(%to, %tx_hash, "transaction sent");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<bool, ChainError> {
        let poll = async {
            loop {
                let receipt = self
                    .provider
                    .get_transaction_receipt(tx_hash)
                    .await
                    .map_err(transport_error)?;
                match receipt {
                    Some(receipt) => return Ok::<_, ChainError>(receipt.status()),
                    None => {
                        debug!(%tx_hash, "receipt not available yet");
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        };
        tokio::time::timeout(self.confirmation_timeout, poll)
            .await
            .map_err(|_| ChainError::TimedOut {
                tx_hash,
                waited: self.confirmation_timeout,
            })?
    }
}

/// The pool state needed to pick a range: tokens, fee tier, spacing and
/// the current `slot0` price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub pool: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_spacing: i32,
    pub liquidity: u128,
    pub quote: PriceQuote,
}

/// Reads a pool's static parameters and current price. A failing
/// `tickSpacing()` is an error; there is no fallback spacing.
pub async fn read_pool<P: Provider>(provider: &P, pool: Address) -> Result<PoolSnapshot, ChainError> {
    let contract = IUniswapV3Pool::new(pool, provider);
    let slot0 = contract.slot0().call().await.map_err(contract_error)?;
    let tick_spacing = contract.tickSpacing().call().await.map_err(contract_error)?;
    let token0 = contract.token0().call().await.map_err(contract_error)?;
    let token1 = contract.token1().call().await.map_err(contract_error)?;
    let fee = contract.fee().call().await.map_err(contract_error)?;
    let liquidity = contract.liquidity().call().await.map_err(contract_error)?;

    let quote = PriceQuote::new(slot0.sqrtPriceX96, slot0.tick.as_i32());
    debug!(%pool, tick = quote.tick, sqrt_price_x96 = %quote.sqrt_price_x96, "read slot0");
    Ok(PoolSnapshot {
        pool,
        token0,
        token1,
        fee: fee.to::<u32>(),
        tick_spacing: tick_spacing.as_i32(),
        liquidity,
        quote,
    })
}

/// `ticks(tick)` for each of `ticks`, one call at a time.
pub async fn read_ticks<P: Provider>(
    provider: &P,
    pool: Address,
    ticks: &[i32],
) -> Result<Vec<TickInfo>, ChainError> {
    let contract = IUniswapV3Pool::new(pool, provider);
    let mut infos = Vec::with_capacity(ticks.len());
    for tick in ticks {
        let word = I24::try_from(*tick)
            .map_err(|_| ChainError::Contract(format!("tick {tick} does not fit in int24")))?;
        let value = contract.ticks(word).call().await.map_err(contract_error)?;
        infos.push(TickInfo::from_return(*tick, &value));
    }
    Ok(infos)
}
