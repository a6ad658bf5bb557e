//! Run-wide settings.
//!
//! Settings are layered, later sources overriding earlier ones:
//! built-in defaults, the optional TOML settings file, `SOLDEPLOY_*` environment
//! variables, and finally explicit CLI flags (applied by the binary).

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// The default name of the settings file.
pub const SETTINGS_FILENAME: &str = "Soldeploy.toml";

/// Prefix of the environment variables overriding settings.
pub const ENV_PREFIX: &str = "SOLDEPLOY_";

/// Default gas limit attached to profile-driven deployments.
pub const DEFAULT_GAS_LIMIT: u64 = 3_000_000;

/// Default delay between two profile-driven rounds (5 minutes).
pub const DEFAULT_ROUND_INTERVAL_SECS: u64 = 5 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// JSON file listing the deployment profiles.
    pub config_file: PathBuf,
    /// File holding one private key per line.
    pub key_file: PathBuf,
    /// Append-only file receiving one line per round.
    pub result_file: PathBuf,
    /// Delay between two profile-driven rounds, in seconds.
    pub round_interval_secs: u64,
    /// Gas limit attached to profile-driven deployments.
    pub gas_limit: u64,
    /// Path or name of the `solc` binary.
    pub solc: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("config.json"),
            key_file: PathBuf::from("keys.txt"),
            result_file: PathBuf::from("hasilDeploy.txt"),
            round_interval_secs: DEFAULT_ROUND_INTERVAL_SECS,
            gas_limit: DEFAULT_GAS_LIMIT,
            solc: PathBuf::from("solc"),
        }
    }
}

impl Settings {
    /// Load settings from defaults, the given TOML file (if it exists) and the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));

        let settings = Self::from_figment(figment)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;

        tracing::debug!(?settings, "Settings loaded");
        Ok(settings)
    }

    /// Extract settings from an already layered figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment.extract().context("Invalid settings")
    }

    pub fn round_interval(&self) -> Duration {
        Duration::from_secs(self.round_interval_secs)
    }
}
