use std::fmt;

use alloy::{
    primitives::{aliases::U48, Address, Bytes, B256, U160, U256},
    sol_types::SolCall,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::signer::{Deadlines, Permit2Signer, SignedPermit, TokenPermit};
use crate::{
    error::{ChainError, Permit2Error},
    sol_types::{PermitSingle, IERC20},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermitState {
    Start,
    CheckTokenAllowance,
    NeedsErc20Approval,
    Erc20ApprovalSent,
    Erc20ApprovalConfirmed,
    FetchNonce,
    Sign,
    SubmitPermitTx,
    Confirmed,
    Failed,
}

impl fmt::Display for PermitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermitState::Start => "START",
            PermitState::CheckTokenAllowance => "CHECK_TOKEN_ALLOWANCE",
            PermitState::NeedsErc20Approval => "NEEDS_ERC20_APPROVAL",
            PermitState::Erc20ApprovalSent => "ERC20_APPROVAL_SENT",
            PermitState::Erc20ApprovalConfirmed => "ERC20_APPROVAL_CONFIRMED",
            PermitState::FetchNonce => "FETCH_NONCE",
            PermitState::Sign => "SIGN",
            PermitState::SubmitPermitTx => "SUBMIT_PERMIT_TX",
            PermitState::Confirmed => "CONFIRMED",
            PermitState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Where the nonce that goes into the signed details comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonceSource {
    /// `allowance(owner, token, spender).nonce`, what AllowanceTransfer checks.
    #[default]
    AllowanceTriple,
    /// `nonces(owner)`, for deployments that track one nonce per owner.
    OwnerNonces,
}

/// The `(amount, expiration, nonce)` triple Permit2 stores per
/// (owner, token, spender).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Permit2Allowance {
    pub amount: U160,
    pub expiration: U48,
    pub nonce: U48,
}

/// Chain access the approval flow needs. Sends return once the transaction
/// is accepted by the node; `wait_for_receipt` reports the execution status.
#[allow(async_fn_in_trait)]
pub trait PermitChain {
    async fn block_timestamp(&self) -> Result<u64, ChainError>;

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

    async fn permit2_allowance(
        &self,
        permit2: Address,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<Permit2Allowance, ChainError>;

    async fn permit2_owner_nonce(&self, permit2: Address, owner: Address) -> Result<U48, ChainError>;

    async fn send_transaction(&self, to: Address, input: Bytes) -> Result<B256, ChainError>;

    /// `true` when the transaction executed successfully.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<bool, ChainError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitRequest {
    pub token: Address,
    pub spender: Address,
    pub amount: U256,
    pub expiration: Option<U48>,
    pub sig_deadline: Option<U256>,
    pub nonce_source: NonceSource,
}

impl PermitRequest {
    pub fn new(token: Address, spender: Address, amount: U256) -> Self {
        PermitRequest {
            token,
            spender,
            amount,
            expiration: None,
            sig_deadline: None,
            nonce_source: NonceSource::default(),
        }
    }

    pub fn with_expiration(mut self, expiration: U48) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn with_sig_deadline(mut self, sig_deadline: U256) -> Self {
        self.sig_deadline = Some(sig_deadline);
        self
    }

    pub fn with_nonce_source(mut self, nonce_source: NonceSource) -> Self {
        self.nonce_source = nonce_source;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitOutcome {
    pub states: Vec<PermitState>,
    pub approval_tx: Option<B256>,
    pub permit_tx: B256,
    pub signed: SignedPermit<PermitSingle>,
}

/// A failed run. `approval_tx` is set when an ERC-20 approval went out
/// before the failure; that approval stays on chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("permit flow failed: {error}")]
pub struct PermitFailure {
    #[source]
    pub error: Permit2Error,
    pub states: Vec<PermitState>,
    pub approval_tx: Option<B256>,
}

impl From<Permit2Error> for PermitFailure {
    fn from(error: Permit2Error) -> Self {
        PermitFailure {
            error,
            states: Vec::new(),
            approval_tx: None,
        }
    }
}

#[derive(Debug, Default)]
struct Trace {
    states: Vec<PermitState>,
    approval_tx: Option<B256>,
}

impl Trace {
    fn enter(&mut self, state: PermitState) {
        debug!(%state, "permit flow");
        self.states.push(state);
    }

    fn fail(mut self, error: Permit2Error) -> PermitFailure {
        self.enter(PermitState::Failed);
        warn!(%error, approval_tx = ?self.approval_tx, "permit flow failed");
        PermitFailure {
            error,
            states: self.states,
            approval_tx: self.approval_tx,
        }
    }
}

/// Runs the full approval flow for `request` and returns the visited states.
///
/// Permit2 is approved for `U256::MAX` on the token when the current ERC-20
/// allowance is below `request.amount`.
pub async fn authorize<C: PermitChain>(
    chain: &C,
    signer: &Permit2Signer,
    request: &PermitRequest,
) -> Result<PermitOutcome, PermitFailure> {
    let mut trace = Trace::default();
    trace.enter(PermitState::Start);
    match run(chain, signer, request, &mut trace).await {
        Ok((permit_tx, signed)) => {
            info!(
                token = %request.token,
                spender = %request.spender,
                amount = %request.amount,
                %permit_tx,
                "permit confirmed"
            );
            Ok(PermitOutcome {
                states: trace.states,
                approval_tx: trace.approval_tx,
                permit_tx,
                signed,
            })
        }
        Err(error) => Err(trace.fail(error)),
    }
}

async fn run<C: PermitChain>(
    chain: &C,
    signer: &Permit2Signer,
    request: &PermitRequest,
    trace: &mut Trace,
) -> Result<(B256, SignedPermit<PermitSingle>), Permit2Error> {
    if request.amount.bit_len() > 160 {
        return Err(Permit2Error::AmountOverflow(request.amount));
    }
    let owner = signer.owner();
    let permit2 = signer.permit2();
    let token = request.token;

    trace.enter(PermitState::CheckTokenAllowance);
    let allowance = chain.erc20_allowance(token, owner, permit2).await?;
    if allowance < request.amount {
        trace.enter(PermitState::NeedsErc20Approval);
        info!(%token, %allowance, required = %request.amount, "approving Permit2 on token");
        let approve = IERC20::approveCall {
            spender: permit2,
            amount: U256::MAX,
        };
        let tx_hash = match chain.send_transaction(token, approve.abi_encode().into()).await {
            Ok(tx_hash) => tx_hash,
            Err(ChainError::Contract(reason)) => {
                warn!(%reason, "approval rejected before inclusion");
                return Err(Permit2Error::Erc20ApprovalFailed { tx_hash: None });
            }
            Err(err) => return Err(err.into()),
        };
        trace.approval_tx = Some(tx_hash);
        trace.enter(PermitState::Erc20ApprovalSent);
        if !chain.wait_for_receipt(tx_hash).await? {
            return Err(Permit2Error::Erc20ApprovalFailed { tx_hash: Some(tx_hash) });
        }
        trace.enter(PermitState::Erc20ApprovalConfirmed);
    } else {
        debug!(%token, %allowance, "Permit2 already approved on token");
    }

    trace.enter(PermitState::FetchNonce);
    let nonce = fetch_nonce(chain, permit2, owner, request).await?;

    trace.enter(PermitState::Sign);
    let deadlines = match (request.expiration, request.sig_deadline) {
        (Some(expiration), Some(sig_deadline)) => Deadlines {
            expiration,
            sig_deadline,
        },
        (expiration, sig_deadline) => {
            let now = chain.block_timestamp().await?;
            Deadlines::resolve(now, expiration, sig_deadline)
        }
    };
    let entry = TokenPermit {
        token,
        amount: request.amount,
        nonce,
    };
    let permit = signer.permit_single(entry, request.spender, deadlines)?;
    let signed = signer.sign_single(permit)?;

    trace.enter(PermitState::SubmitPermitTx);
    let tx_hash = match chain.send_transaction(permit2, signed.calldata(owner)).await {
        Ok(tx_hash) => tx_hash,
        Err(ChainError::Contract(reason)) => {
            warn!(%reason, "permit rejected before inclusion");
            return Err(permit_failure(chain, permit2, owner, request, nonce, None).await);
        }
        Err(err) => return Err(err.into()),
    };
    if !chain.wait_for_receipt(tx_hash).await? {
        return Err(permit_failure(chain, permit2, owner, request, nonce, Some(tx_hash)).await);
    }
    trace.enter(PermitState::Confirmed);
    Ok((tx_hash, signed))
}

async fn fetch_nonce<C: PermitChain>(
    chain: &C,
    permit2: Address,
    owner: Address,
    request: &PermitRequest,
) -> Result<U48, ChainError> {
    match request.nonce_source {
        NonceSource::AllowanceTriple => Ok(chain
            .permit2_allowance(permit2, owner, request.token, request.spender)
            .await?
            .nonce),
        NonceSource::OwnerNonces => chain.permit2_owner_nonce(permit2, owner).await,
    }
}

/// A failed permit whose nonce has moved on since signing is reported as
/// stale rather than as a plain revert.
async fn permit_failure<C: PermitChain>(
    chain: &C,
    permit2: Address,
    owner: Address,
    request: &PermitRequest,
    signed_nonce: U48,
    tx_hash: Option<B256>,
) -> Permit2Error {
    match fetch_nonce(chain, permit2, owner, request).await {
        Ok(current) if current != signed_nonce => Permit2Error::StaleNonce {
            signed: signed_nonce.to::<u64>(),
            current: current.to::<u64>(),
        },
        Ok(_) => Permit2Error::PermitTxFailed { tx_hash },
        Err(err) => {
            warn!(%err, "could not re-read nonce after failed permit");
            Permit2Error::PermitTxFailed { tx_hash }
        }
    }
}

/// Snapshot of everything that decides whether a new permit is needed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PermitStatus {
    pub token_approved_for_permit2: bool,
    pub erc20_allowance: U256,
    pub token_balance: U256,
    pub allowance: Permit2Allowance,
    pub block_timestamp: u64,
    pub is_valid: bool,
    pub is_sufficient: bool,
    pub needs_permit: bool,
}

pub async fn check_permit<C: PermitChain>(
    chain: &C,
    permit2: Address,
    owner: Address,
    token: Address,
    spender: Address,
    required: Option<U256>,
) -> Result<PermitStatus, Permit2Error> {
    let erc20_allowance = chain.erc20_allowance(token, owner, permit2).await?;
    let token_balance = chain.erc20_balance(token, owner).await?;
    let allowance = chain.permit2_allowance(permit2, owner, token, spender).await?;
    let block_timestamp = chain.block_timestamp().await?;

    let is_valid = !allowance.amount.is_zero() && allowance.expiration > U48::saturating_from(block_timestamp);
    let is_sufficient = required.map_or(true, |required| U256::from(allowance.amount) >= required);
    Ok(PermitStatus {
        token_approved_for_permit2: !erc20_allowance.is_zero(),
        erc20_allowance,
        token_balance,
        allowance,
        block_timestamp,
        is_valid,
        is_sufficient,
        needs_permit: !(is_valid && is_sufficient),
    })
}

/// Runs [`authorize`] only when the current Permit2 allowance is expired or
/// too small. `None` means the existing allowance already covers `request`.
pub async fn ensure_permit<C: PermitChain>(
    chain: &C,
    signer: &Permit2Signer,
    request: &PermitRequest,
) -> Result<Option<PermitOutcome>, PermitFailure> {
    let status = check_permit(
        chain,
        signer.permit2(),
        signer.owner(),
        request.token,
        request.spender,
        Some(request.amount),
    )
    .await?;
    if !status.needs_permit {
        info!(
            token = %request.token,
            spender = %request.spender,
            amount = %status.allowance.amount,
            expiration = %status.allowance.expiration,
            "Permit2 allowance already valid"
        );
        return Ok(None);
    }
    authorize(chain, signer, request).await.map(Some)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{permit2::PERMIT2_ADDRESS, sol_types::IPermit2};
    use alloy::{
        primitives::{address, Address},
        signers::local::PrivateKeySigner,
    };
    use std::{collections::HashMap, str::FromStr, sync::Mutex};

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TOKEN: Address = address!("af204776c7245bF4147c2612BF6e5972Ee483701");
    const SPENDER: Address = address!("3fc91A3afd70395Cd496C647d5a6CC9D4B2b7FAD");
    const NOW: u64 = 1_700_000_000;

    struct MockChain {
        erc20_allowance: Mutex<U256>,
        balance: U256,
        allowance: Mutex<Permit2Allowance>,
        owner_nonce: U48,
        approve_succeeds: bool,
        approve_rejected_on_send: bool,
        permit_succeeds: bool,
        permit_rejected_on_send: bool,
        // nonce the chain moves to when a permit fails
        nonce_after_failed_permit: Option<U48>,
        sent: Mutex<Vec<(Address, Bytes)>>,
        receipts: Mutex<HashMap<B256, bool>>,
    }

    impl Default for MockChain {
        fn default() -> Self {
            MockChain {
                erc20_allowance: Mutex::new(U256::ZERO),
                balance: U256::from(10u64.pow(18)),
                allowance: Mutex::new(Permit2Allowance {
                    nonce: U48::from(3),
                    ..Default::default()
                }),
                owner_nonce: U48::from(9),
                approve_succeeds: true,
                approve_rejected_on_send: false,
                permit_succeeds: true,
                permit_rejected_on_send: false,
                nonce_after_failed_permit: None,
                sent: Mutex::new(Vec::new()),
                receipts: Mutex::new(HashMap::new()),
            }
        }
    }

    impl MockChain {
        fn sent(&self) -> Vec<(Address, Bytes)> {
            self.sent.lock().unwrap().clone()
        }

        fn fail_permit(&self) {
            if let Some(nonce) = self.nonce_after_failed_permit {
                self.allowance.lock().unwrap().nonce = nonce;
            }
        }
    }

    impl PermitChain for MockChain {
        async fn block_timestamp(&self) -> Result<u64, ChainError> {
            Ok(NOW)
        }

        async fn erc20_allowance(&self, _: Address, _: Address, _: Address) -> Result<U256, ChainError> {
            Ok(*self.erc20_allowance.lock().unwrap())
        }

        async fn erc20_balance(&self, _: Address, _: Address) -> Result<U256, ChainError> {
            Ok(self.balance)
        }

        async fn permit2_allowance(
            &self,
            _: Address,
            _: Address,
            _: Address,
            _: Address,
        ) -> Result<Permit2Allowance, ChainError> {
            Ok(*self.allowance.lock().unwrap())
        }

        async fn permit2_owner_nonce(&self, _: Address, _: Address) -> Result<U48, ChainError> {
            Ok(self.owner_nonce)
        }

        async fn send_transaction(&self, to: Address, input: Bytes) -> Result<B256, ChainError> {
            let is_approve = input[..4] == IERC20::approveCall::SELECTOR;
            if is_approve && self.approve_rejected_on_send {
                return Err(ChainError::Contract("execution reverted: token paused".to_string()));
            }
            if !is_approve && self.permit_rejected_on_send {
                self.fail_permit();
                return Err(ChainError::Contract("execution reverted: InvalidNonce()".to_string()));
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push((to, input));
            let tx_hash = B256::with_last_byte(sent.len() as u8);

            let success = if is_approve {
                if self.approve_succeeds {
                    *self.erc20_allowance.lock().unwrap() = U256::MAX;
                }
                self.approve_succeeds
            } else {
                if !self.permit_succeeds {
                    self.fail_permit();
                }
                self.permit_succeeds
            };
            self.receipts.lock().unwrap().insert(tx_hash, success);
            Ok(tx_hash)
        }

        async fn wait_for_receipt(&self, tx_hash: B256) -> Result<bool, ChainError> {
            self.receipts
                .lock()
                .unwrap()
                .get(&tx_hash)
                .copied()
                .ok_or(ChainError::TimedOut {
                    tx_hash,
                    waited: std::time::Duration::from_secs(120),
                })
        }
    }

    fn signer() -> Permit2Signer {
        Permit2Signer::new(PrivateKeySigner::from_str(DEV_KEY).unwrap(), 100, PERMIT2_ADDRESS)
    }

    fn request() -> PermitRequest {
        PermitRequest::new(TOKEN, SPENDER, U256::from(1_000))
    }

    fn decode_permit(input: &Bytes) -> IPermit2::permit_0Call {
        IPermit2::permit_0Call::abi_decode(input).unwrap()
    }

    #[tokio::test]
    async fn sufficient_allowance_skips_approval() {
        let chain = MockChain {
            erc20_allowance: Mutex::new(U256::from(1_000)),
            ..Default::default()
        };
        let signer = signer();
        let outcome = authorize(&chain, &signer, &request()).await.unwrap();

        assert_eq!(
            outcome.states,
            vec![
                PermitState::Start,
                PermitState::CheckTokenAllowance,
                PermitState::FetchNonce,
                PermitState::Sign,
                PermitState::SubmitPermitTx,
                PermitState::Confirmed,
            ]
        );
        assert_eq!(outcome.approval_tx, None);

        let sent = chain.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, PERMIT2_ADDRESS);
        let call = decode_permit(&sent[0].1);
        assert_eq!(call.owner, signer.owner());
        assert_eq!(call.permitSingle.details.nonce, U48::from(3));
        assert_eq!(call.permitSingle.details.expiration, U48::from(NOW + 86_400));
        assert_eq!(call.permitSingle.sigDeadline, U256::from(NOW + 30 * 86_400));
        assert_eq!(call.permitSingle.spender, SPENDER);
        assert_eq!(call.permitSingle, outcome.signed.permit);
    }

    #[tokio::test]
    async fn missing_allowance_approves_permit2_first() {
        let chain = MockChain::default();
        assert_eq!(*chain.erc20_allowance.lock().unwrap(), U256::ZERO);
        assert_eq!(request().amount, U256::from(1_000));
        let outcome = authorize(&chain, &signer(), &request()).await.unwrap();

        assert_eq!(
            outcome.states,
            vec![
                PermitState::Start,
                PermitState::CheckTokenAllowance,
                PermitState::NeedsErc20Approval,
                PermitState::Erc20ApprovalSent,
                PermitState::Erc20ApprovalConfirmed,
                PermitState::FetchNonce,
                PermitState::Sign,
                PermitState::SubmitPermitTx,
                PermitState::Confirmed,
            ]
        );

        let sent = chain.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, TOKEN);
        let approve = IERC20::approveCall::abi_decode(&sent[0].1).unwrap();
        assert_eq!(approve.spender, PERMIT2_ADDRESS);
        assert_eq!(approve.amount, U256::MAX);
        assert_eq!(outcome.approval_tx, Some(B256::with_last_byte(1)));
        assert_eq!(outcome.permit_tx, B256::with_last_byte(2));
    }

    #[tokio::test]
    async fn failed_approval_stops_the_flow() {
        let chain = MockChain {
            approve_succeeds: false,
            ..Default::default()
        };
        let failure = authorize(&chain, &signer(), &request()).await.unwrap_err();

        let tx_hash = B256::with_last_byte(1);
        assert_eq!(
            failure.error,
            Permit2Error::Erc20ApprovalFailed {
                tx_hash: Some(tx_hash)
            }
        );
        assert_eq!(failure.approval_tx, Some(tx_hash));
        assert_eq!(
            failure.states[failure.states.len() - 2..],
            [PermitState::Erc20ApprovalSent, PermitState::Failed]
        );
        assert_eq!(chain.sent().len(), 1);
    }

    #[tokio::test]
    async fn approval_rejected_at_send_is_an_approval_failure() {
        let chain = MockChain {
            approve_rejected_on_send: true,
            ..Default::default()
        };
        let failure = authorize(&chain, &signer(), &request()).await.unwrap_err();

        assert_eq!(failure.error, Permit2Error::Erc20ApprovalFailed { tx_hash: None });
        assert_eq!(failure.approval_tx, None);
        assert_eq!(
            failure.states,
            vec![
                PermitState::Start,
                PermitState::CheckTokenAllowance,
                PermitState::NeedsErc20Approval,
                PermitState::Failed,
            ]
        );
        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn reverted_permit_keeps_approval() {
        let chain = MockChain {
            permit_succeeds: false,
            ..Default::default()
        };
        let failure = authorize(&chain, &signer(), &request()).await.unwrap_err();

        assert_eq!(
            failure.error,
            Permit2Error::PermitTxFailed {
                tx_hash: Some(B256::with_last_byte(2))
            }
        );
        assert_eq!(failure.approval_tx, Some(B256::with_last_byte(1)));
        assert_eq!(failure.states.last(), Some(&PermitState::Failed));
        assert!(failure.states.contains(&PermitState::SubmitPermitTx));
    }

    #[tokio::test]
    async fn consumed_nonce_is_reported_stale() {
        let chain = MockChain {
            erc20_allowance: Mutex::new(U256::MAX),
            permit_rejected_on_send: true,
            nonce_after_failed_permit: Some(U48::from(4)),
            ..Default::default()
        };
        let failure = authorize(&chain, &signer(), &request()).await.unwrap_err();
        assert_eq!(failure.error, Permit2Error::StaleNonce { signed: 3, current: 4 });
        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn overrides_and_owner_nonce_are_used() {
        let chain = MockChain {
            erc20_allowance: Mutex::new(U256::MAX),
            ..Default::default()
        };
        let request = request()
            .with_expiration(U48::from(NOW + 60))
            .with_sig_deadline(U256::from(NOW + 120))
            .with_nonce_source(NonceSource::OwnerNonces);
        authorize(&chain, &signer(), &request).await.unwrap();

        let call = decode_permit(&chain.sent()[0].1);
        assert_eq!(call.permitSingle.details.expiration, U48::from(NOW + 60));
        assert_eq!(call.permitSingle.sigDeadline, U256::from(NOW + 120));
        assert_eq!(call.permitSingle.details.nonce, U48::from(9));
    }

    #[tokio::test]
    async fn oversized_amount_fails_before_any_call() {
        let chain = MockChain::default();
        let request = PermitRequest::new(TOKEN, SPENDER, U256::MAX);
        let failure = authorize(&chain, &signer(), &request).await.unwrap_err();
        assert_eq!(failure.error, Permit2Error::AmountOverflow(U256::MAX));
        assert_eq!(failure.states, vec![PermitState::Start, PermitState::Failed]);
        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn check_permit_reports_validity() {
        let chain = MockChain {
            erc20_allowance: Mutex::new(U256::MAX),
            allowance: Mutex::new(Permit2Allowance {
                amount: U160::from(1_000),
                expiration: U48::from(NOW + 10),
                nonce: U48::from(1),
            }),
            ..Default::default()
        };
        let signer = signer();
        let status = check_permit(&chain, PERMIT2_ADDRESS, signer.owner(), TOKEN, SPENDER, Some(U256::from(500)))
            .await
            .unwrap();
        assert!(status.token_approved_for_permit2);
        assert!(status.is_valid);
        assert!(status.is_sufficient);
        assert!(!status.needs_permit);

        let status = check_permit(&chain, PERMIT2_ADDRESS, signer.owner(), TOKEN, SPENDER, Some(U256::from(5_000)))
            .await
            .unwrap();
        assert!(!status.is_sufficient);
        assert!(status.needs_permit);

        chain.allowance.lock().unwrap().expiration = U48::from(NOW);
        let status = check_permit(&chain, PERMIT2_ADDRESS, signer.owner(), TOKEN, SPENDER, None)
            .await
            .unwrap();
        assert!(!status.is_valid);
        assert!(status.needs_permit);
    }

    #[tokio::test]
    async fn ensure_permit_only_signs_when_needed() {
        let chain = MockChain {
            erc20_allowance: Mutex::new(U256::MAX),
            allowance: Mutex::new(Permit2Allowance {
                amount: U160::MAX,
                expiration: U48::from(NOW + 3_600),
                nonce: U48::from(1),
            }),
            ..Default::default()
        };
        assert_eq!(ensure_permit(&chain, &signer(), &request()).await.unwrap(), None);
        assert!(chain.sent().is_empty());

        chain.allowance.lock().unwrap().expiration = U48::from(NOW - 1);
        let outcome = ensure_permit(&chain, &signer(), &request()).await.unwrap();
        assert!(outcome.is_some());
        assert_eq!(chain.sent().len(), 1);
    }

    #[test]
    fn states_render_in_screaming_case() {
        assert_eq!(PermitState::CheckTokenAllowance.to_string(), "CHECK_TOKEN_ALLOWANCE");
        assert_eq!(
            serde_json::to_string(&PermitState::Erc20ApprovalConfirmed).unwrap(),
            "\"ERC20_APPROVAL_CONFIRMED\""
        );
    }
}
