use alloy::{
    primitives::{aliases::U48, Address, Bytes, Signature, B256, U160, U256},
    signers::{local::PrivateKeySigner, SignerSync},
    sol_types::{eip712_domain, Eip712Domain, SolCall, SolStruct},
};
use tracing::debug;

use super::{DEFAULT_EXPIRATION, DEFAULT_SIG_DEADLINE};
use crate::{
    error::Permit2Error,
    sol_types::{IPermit2, PermitBatch, PermitDetails, PermitSingle},
};

/// EIP-712 domain of a Permit2 deployment. Permit2 has no `version` field.
pub fn permit2_domain(chain_id: u64, permit2: Address) -> Eip712Domain {
    eip712_domain! {
        name: "Permit2",
        chain_id: chain_id,
        verifying_contract: permit2,
    }
}

/// `expiration` of the allowance and `sigDeadline` of the signature, both
/// unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub expiration: U48,
    pub sig_deadline: U256,
}

impl Deadlines {
    /// `now + 24h` and `now + 30 days`.
    pub fn from_now(now: u64) -> Self {
        Deadlines {
            expiration: U48::saturating_from(now.saturating_add(DEFAULT_EXPIRATION.as_secs())),
            sig_deadline: U256::from(now.saturating_add(DEFAULT_SIG_DEADLINE.as_secs())),
        }
    }

    /// Defaults from `now`, replaced by whichever override is given.
    pub fn resolve(now: u64, expiration: Option<U48>, sig_deadline: Option<U256>) -> Self {
        let defaults = Deadlines::from_now(now);
        Deadlines {
            expiration: expiration.unwrap_or(defaults.expiration),
            sig_deadline: sig_deadline.unwrap_or(defaults.sig_deadline),
        }
    }
}

/// One token entry of a permit: what to allow and under which nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPermit {
    pub token: Address,
    pub amount: U256,
    pub nonce: U48,
}

impl TokenPermit {
    fn details(&self, expiration: U48) -> Result<PermitDetails, Permit2Error> {
        if self.amount.bit_len() > 160 {
            return Err(Permit2Error::AmountOverflow(self.amount));
        }
        Ok(PermitDetails {
            token: self.token,
            amount: self.amount.to::<U160>(),
            expiration,
            nonce: self.nonce,
        })
    }
}

/// A permit message together with the owner's signature over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPermit<T> {
    pub permit: T,
    pub hash: B256,
    pub signature: Signature,
}

impl<T> SignedPermit<T> {
    /// 65-byte `r || s || v` encoding expected by Permit2.
    pub fn signature_bytes(&self) -> Bytes {
        self.signature.as_bytes().into()
    }
}

impl SignedPermit<PermitSingle> {
    /// Calldata for `permit(owner, PermitSingle, bytes)`.
    pub fn calldata(&self, owner: Address) -> Bytes {
        IPermit2::permit_0Call {
            owner,
            permitSingle: self.permit.clone(),
            signature: self.signature_bytes(),
        }
        .abi_encode()
        .into()
    }
}

impl SignedPermit<PermitBatch> {
    /// Calldata for `permit(owner, PermitBatch, bytes)`.
    pub fn calldata(&self, owner: Address) -> Bytes {
        IPermit2::permit_1Call {
            owner,
            permitBatch: self.permit.clone(),
            signature: self.signature_bytes(),
        }
        .abi_encode()
        .into()
    }
}

/// Signs Permit2 typed data for one owner key on one chain.
#[derive(Debug, Clone)]
pub struct Permit2Signer {
    signer: PrivateKeySigner,
    chain_id: u64,
    permit2: Address,
    domain: Eip712Domain,
}

impl Permit2Signer {
    pub fn new(signer: PrivateKeySigner, chain_id: u64, permit2: Address) -> Self {
        Permit2Signer {
            signer,
            chain_id,
            permit2,
            domain: permit2_domain(chain_id, permit2),
        }
    }

    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn permit2(&self) -> Address {
        self.permit2
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    pub fn permit_single(
        &self,
        entry: TokenPermit,
        spender: Address,
        deadlines: Deadlines,
    ) -> Result<PermitSingle, Permit2Error> {
        Ok(PermitSingle {
            details: entry.details(deadlines.expiration)?,
            spender,
            sigDeadline: deadlines.sig_deadline,
        })
    }

    pub fn permit_batch(
        &self,
        entries: &[TokenPermit],
        spender: Address,
        deadlines: Deadlines,
    ) -> Result<PermitBatch, Permit2Error> {
        if entries.is_empty() {
            return Err(Permit2Error::EmptyBatch);
        }
        let details = entries
            .iter()
            .map(|entry| entry.details(deadlines.expiration))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PermitBatch {
            details,
            spender,
            sigDeadline: deadlines.sig_deadline,
        })
    }

    pub fn signing_hash<T: SolStruct>(&self, permit: &T) -> B256 {
        permit.eip712_signing_hash(&self.domain)
    }

    pub fn sign_single(
        &self,
        permit: PermitSingle,
    ) -> Result<SignedPermit<PermitSingle>, Permit2Error> {
        self.sign(permit)
    }

    pub fn sign_batch(&self, permit: PermitBatch) -> Result<SignedPermit<PermitBatch>, Permit2Error> {
        if permit.details.is_empty() {
            return Err(Permit2Error::EmptyBatch);
        }
        self.sign(permit)
    }

    fn sign<T: SolStruct>(&self, permit: T) -> Result<SignedPermit<T>, Permit2Error> {
        let hash = self.signing_hash(&permit);
        let signature = self
            .signer
            .sign_hash_sync(&hash)
            .map_err(|e| Permit2Error::Signing(e.to_string()))?;
        debug!(owner = %self.owner(), %hash, chain_id = self.chain_id, "signed permit");
        Ok(SignedPermit {
            permit,
            hash,
            signature,
        })
    }
}
