use alloy::primitives::{aliases::U48, Address, U256};
use clap::{Args, Parser, Subcommand};
use dex_toolkit::{
    config::Settings,
    logging,
    permit2::{
        authorize, check_permit, ensure_permit, NonceSource, Permit2Signer, PermitOutcome,
        PermitRequest,
    },
    rpc::{connect_with_wallet, AlloyChain},
};
use eyre::{eyre, Result};
use tracing::info;

/// Grants a spender a Permit2 allowance on a token, approving Permit2 on the
/// token first when needed.
#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report the current ERC-20 and Permit2 allowances
    Check {
        #[arg(long)]
        token: Address,
        #[arg(long)]
        spender: Address,
        /// Required amount in base units
        #[arg(long)]
        amount: Option<U256>,
    },
    /// Sign and submit a permit unconditionally
    Authorize(PermitArgs),
    /// Sign and submit a permit only if the current one is expired or too small
    Ensure(PermitArgs),
}

#[derive(Args)]
struct PermitArgs {
    #[arg(long)]
    token: Address,
    #[arg(long)]
    spender: Address,
    /// Amount in base units, at most 2^160 - 1
    #[arg(long)]
    amount: U256,
    /// Allowance expiration, unix seconds (default: now + 24h)
    #[arg(long)]
    expiration: Option<u64>,
    /// Signature deadline, unix seconds (default: now + 30 days)
    #[arg(long)]
    sig_deadline: Option<u64>,
    /// Sign with `nonces(owner)` instead of the allowance nonce
    #[arg(long)]
    owner_nonces: bool,
}

impl PermitArgs {
    fn request(&self) -> PermitRequest {
        let mut request = PermitRequest::new(self.token, self.spender, self.amount);
        if let Some(expiration) = self.expiration {
            request = request.with_expiration(U48::saturating_from(expiration));
        }
        if let Some(sig_deadline) = self.sig_deadline {
            request = request.with_sig_deadline(U256::from(sig_deadline));
        }
        if self.owner_nonces {
            request = request.with_nonce_source(NonceSource::OwnerNonces);
        }
        request
    }
}

fn outcome_report(outcome: &PermitOutcome) -> serde_json::Value {
    serde_json::json!({
        "states": outcome.states,
        "approval_tx": outcome.approval_tx,
        "permit_tx": outcome.permit_tx,
        "nonce": outcome.signed.permit.details.nonce.to::<u64>(),
        "expiration": outcome.signed.permit.details.expiration.to::<u64>(),
        "sig_deadline": outcome.signed.permit.sigDeadline.to_string(),
        "signature": outcome.signed.signature_bytes(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let key = settings.signer()?.clone();
    let signer = Permit2Signer::new(key.clone(), settings.chain.chain_id, settings.chain.permit2);

    let provider = connect_with_wallet(settings.rpc_url.clone(), key);
    let chain = AlloyChain::new(provider, signer.owner(), settings.chain.confirmation_timeout);

    let remote_chain_id = chain.chain_id().await?;
    if remote_chain_id != settings.chain.chain_id {
        return Err(eyre!(
            "RPC serves chain {remote_chain_id}, configured for {} ({})",
            settings.chain.chain_id,
            settings.chain.name
        ));
    }
    info!(owner = %signer.owner(), chain = settings.chain.name, permit2 = %signer.permit2(), "ready");

    let report = match cli.command {
        Command::Check {
            token,
            spender,
            amount,
        } => {
            let status = check_permit(&chain, signer.permit2(), signer.owner(), token, spender, amount).await?;
            serde_json::to_value(status)?
        }
        Command::Authorize(args) => {
            let outcome = authorize(&chain, &signer, &args.request()).await?;
            outcome_report(&outcome)
        }
        Command::Ensure(args) => match ensure_permit(&chain, &signer, &args.request()).await? {
            Some(outcome) => outcome_report(&outcome),
            None => {
                info!("existing Permit2 allowance already covers the request, nothing sent");
                serde_json::json!({ "states": [], "needs_permit": false })
            }
        },
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
