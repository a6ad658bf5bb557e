//! soldeploy-core - Compile and deploy Solidity contracts to EVM chains.
//!
//! This crate compiles a single Solidity source with `solc`, encodes constructor
//! arguments against the resulting ABI and deploys the contract once per private key
//! (profile-driven mode, repeated on a fixed interval) or a fixed number of times with
//! one key (ad-hoc mode). Every round appends the deployed addresses to a result file.

pub mod config;
pub use config::{DeploymentProfile, PrivateKeySet};

mod settings;
pub use settings::{
    DEFAULT_GAS_LIMIT, DEFAULT_ROUND_INTERVAL_SECS, ENV_PREFIX, SETTINGS_FILENAME, Settings,
};

pub mod compiler;
pub use compiler::{ArtifactCache, CompiledArtifact, ContractCompiler, SolcCompiler};

pub mod constructor;

pub mod executor;
pub use executor::{
    ContractDeployer, DeployedContract, DeploymentFailure, RoundOutcome, RoundReport,
    RpcDeployer,
};

mod results;
pub use results::{ResultLog, format_result_line};

pub mod schedule;
pub use schedule::{ShutdownSignal, ShutdownTrigger, shutdown_channel};

pub mod console;
pub use console::{Console, ScriptedConsole, Terminal};

pub mod session;
pub use session::{SessionExit, run_adhoc_mode, run_profile_mode};

/// Build the RPC deployer used for a profile, with an optional fixed gas limit.
pub fn rpc_deployer(profile: &DeploymentProfile, gas_limit: Option<u64>) -> RpcDeployer {
    let deployer = RpcDeployer::for_profile(profile);
    match gas_limit {
        Some(gas_limit) => deployer.gas_limit(gas_limit),
        None => deployer,
    }
}
