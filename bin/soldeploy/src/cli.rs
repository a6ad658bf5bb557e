use std::path::PathBuf;

use clap::{Parser, Subcommand};
use soldeploy_core::{SETTINGS_FILENAME, Settings};
use tracing::level_filters::LevelFilter;

/// How the deployment parameters are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Subcommand, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Mode {
    /// Pick a profile from the profile file and deploy once per private key, every interval.
    #[default]
    Profile,
    /// Type in the connection parameters and deploy a given number of contracts with one key.
    Adhoc,
}

#[derive(Debug, Parser)]
#[command(name = "soldeploy")]
#[command(
    author,
    version,
    about = "Compile a Solidity contract and deploy it to EVM chains"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "SOLDEPLOY_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to the TOML settings file. A missing file is ignored.
    #[arg(long, env = "SOLDEPLOY_SETTINGS", default_value = SETTINGS_FILENAME)]
    pub settings: PathBuf,

    /// JSON file listing the deployment profiles.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// File holding one private key per line.
    #[arg(long)]
    pub keys: Option<PathBuf>,

    /// File receiving one `DEPLOYED_CONTRACTS_<chain id>=...` line per round.
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Delay between two profile-driven rounds, in seconds.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Gas limit attached to profile-driven deployments.
    #[arg(long)]
    pub gas_limit: Option<u64>,

    /// Path or name of the `solc` binary.
    #[arg(long)]
    pub solc: Option<PathBuf>,

    #[command(subcommand)]
    pub mode: Option<Mode>,
}

impl Cli {
    /// The selected mode, profile-driven unless told otherwise.
    pub fn mode(&self) -> Mode {
        self.mode.unwrap_or_default()
    }

    /// Apply the explicit flags on top of the loaded settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(config) = &self.config {
            settings.config_file = config.clone();
        }
        if let Some(keys) = &self.keys {
            settings.key_file = keys.clone();
        }
        if let Some(results) = &self.results {
            settings.result_file = results.clone();
        }
        if let Some(interval) = self.interval {
            settings.round_interval_secs = interval;
        }
        if let Some(gas_limit) = self.gas_limit {
            settings.gas_limit = gas_limit;
        }
        if let Some(solc) = &self.solc {
            settings.solc = solc.clone();
        }
    }
}
