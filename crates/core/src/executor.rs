//! Contract-creation transactions and the two deployment strategies.
//!
//! - [`run_key_round`]: one deployment per private key, each key signing its own
//!   transaction (profile-driven mode).
//! - [`run_repeated_signer`]: a fixed number of deployments, all signed by the same
//!   key (ad-hoc mode).
//!
//! Both strategies are strictly sequential and never abort on a single failure.

use std::{future::Future, str::FromStr};

use alloy_core::primitives::{Address, B256, Bytes};
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use url::Url;

use crate::{DeploymentProfile, config::PrivateKeySet};

/// A confirmed contract deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployedContract {
    /// Account that signed the creation transaction.
    pub deployer: Address,
    /// Address of the new contract.
    pub address: Address,
    pub tx_hash: B256,
}

/// A deployment attempt that did not produce a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentFailure {
    /// 1-based attempt number within the round.
    pub attempt: usize,
    pub error: String,
}

/// Outcome of every attempt of one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundReport {
    pub attempted: usize,
    /// Successful deployments, in processing order.
    pub deployed: Vec<DeployedContract>,
    pub failures: Vec<DeploymentFailure>,
}

impl RoundReport {
    pub fn addresses(&self) -> Vec<Address> {
        self.deployed.iter().map(|contract| contract.address).collect()
    }

    fn record(&mut self, attempt: usize, result: Result<DeployedContract>) {
        self.attempted += 1;

        match result {
            Ok(contract) => {
                tracing::info!(
                    attempt,
                    deployer = %contract.deployer,
                    address = %contract.address,
                    tx_hash = %contract.tx_hash,
                    "Contract deployed"
                );
                self.deployed.push(contract);
            }
            Err(err) => {
                let error = format!("{:#}", err);
                tracing::error!(attempt, error = %error, "Deployment failed");
                self.failures.push(DeploymentFailure { attempt, error });
            }
        }
    }
}

/// Result of a per-key round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The key set was empty, nothing was attempted.
    NoKeys,
    Completed(RoundReport),
}

/// Something able to sign and submit a contract-creation transaction and wait for it.
pub trait ContractDeployer {
    fn deploy(
        &self,
        signer: &PrivateKeySigner,
        init_code: &Bytes,
    ) -> impl Future<Output = Result<DeployedContract>> + Send;
}

/// Deploys through a JSON-RPC endpoint, one provider per signer.
#[derive(Debug, Clone)]
pub struct RpcDeployer {
    rpc_url: Url,
    chain_id: u64,
    gas_limit: Option<u64>,
}

impl RpcDeployer {
    pub fn new(rpc_url: Url, chain_id: u64) -> Self {
        Self {
            rpc_url,
            chain_id,
            gas_limit: None,
        }
    }

    pub fn for_profile(profile: &DeploymentProfile) -> Self {
        Self::new(profile.rpc_url.clone(), profile.chain_id)
    }

    /// Attach a fixed gas limit instead of letting the provider estimate it.
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    fn creation_request(&self, init_code: &Bytes) -> TransactionRequest {
        let mut tx = TransactionRequest::default()
            .with_deploy_code(init_code.clone())
            .with_chain_id(self.chain_id);

        if let Some(gas_limit) = self.gas_limit {
            tx.set_gas_limit(gas_limit);
        }

        tx
    }
}

impl ContractDeployer for RpcDeployer {
    async fn deploy(
        &self,
        signer: &PrivateKeySigner,
        init_code: &Bytes,
    ) -> Result<DeployedContract> {
        let deployer = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(self.rpc_url.clone());

        let pending = provider
            .send_transaction(self.creation_request(init_code))
            .await
            .with_context(|| format!("Failed to send deployment transaction from {}", deployer))?;

        tracing::info!(
            %deployer,
            tx_hash = %pending.tx_hash(),
            "Waiting for transaction confirmation..."
        );

        let receipt = pending
            .get_receipt()
            .await
            .context("Failed to fetch deployment receipt")?;

        if !receipt.status() {
            anyhow::bail!(
                "Deployment transaction {} reverted",
                receipt.transaction_hash
            );
        }

        let address = receipt.contract_address.with_context(|| {
            format!(
                "Receipt of {} carries no contract address",
                receipt.transaction_hash
            )
        })?;

        Ok(DeployedContract {
            deployer,
            address,
            tx_hash: receipt.transaction_hash,
        })
    }
}

/// Parse a private key, with or without `0x` prefix.
pub fn parse_signer(key: &str) -> Result<PrivateKeySigner> {
    // The key itself is deliberately left out of the error.
    PrivateKeySigner::from_str(key.trim()).map_err(|_| anyhow::anyhow!("Invalid private key"))
}

/// Deploy once per key, each key signing its own transaction.
///
/// Returns [`RoundOutcome::NoKeys`] without attempting anything when `keys` is empty.
/// An unparsable key or a failed deployment is recorded and the round moves on.
pub async fn run_key_round<D: ContractDeployer>(
    deployer: &D,
    init_code: &Bytes,
    keys: &PrivateKeySet,
) -> RoundOutcome {
    if keys.is_empty() {
        return RoundOutcome::NoKeys;
    }

    let total = keys.len();
    let mut report = RoundReport::default();

    for (index, key) in keys.iter().enumerate() {
        let attempt = index + 1;

        let result = match parse_signer(key) {
            Ok(signer) => {
                tracing::info!(
                    attempt,
                    total,
                    account = %signer.address(),
                    "Deploying contract..."
                );
                deployer.deploy(&signer, init_code).await
            }
            Err(err) => Err(err.context(format!("Key {} cannot be used", attempt))),
        };

        report.record(attempt, result);
    }

    RoundOutcome::Completed(report)
}

/// Deploy `count` contracts sequentially with the same signer.
///
/// `payload_for` is called before every deployment with the 1-based attempt number and
/// returns the creation payload; an error skips that deployment.
pub async fn run_repeated_signer<D, F>(
    deployer: &D,
    signer: &PrivateKeySigner,
    count: usize,
    mut payload_for: F,
) -> RoundReport
where
    D: ContractDeployer,
    F: FnMut(usize) -> Result<Bytes>,
{
    let mut report = RoundReport::default();

    for attempt in 1..=count {
        tracing::info!(attempt, total = count, account = %signer.address(), "Deploying contract...");

        let result = match payload_for(attempt) {
            Ok(init_code) => deployer.deploy(signer, &init_code).await,
            Err(err) => Err(err),
        };

        report.record(attempt, result);
    }

    report
}
