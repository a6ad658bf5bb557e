//! Deployment profiles and private key files.

use std::{fmt, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

/// A named deployment target loaded from the profile file.
///
/// The on-disk keys follow the upper-case names used by existing profile files
/// (`RPC_URL`, `CHAIN_ID`, ...), only `name` is lower-case.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeploymentProfile {
    /// Display name shown in the selection menu.
    pub name: String,
    /// JSON-RPC endpoint of the target chain.
    #[serde(rename = "RPC_URL")]
    pub rpc_url: Url,
    /// Chain id, accepted either as a number or as a numeric string.
    #[serde(rename = "CHAIN_ID", deserialize_with = "deserialize_chain_id")]
    pub chain_id: u64,
    /// Path to the Solidity source file.
    #[serde(rename = "CONTRACT_PATH")]
    pub contract_path: String,
    /// Constructor argument values, in declaration order.
    #[serde(rename = "CONSTRUCTOR_ARGS", default)]
    pub constructor_args: Vec<Value>,
}

impl DeploymentProfile {
    /// Build a profile from values typed in by the operator.
    pub fn ad_hoc(rpc_url: Url, chain_id: u64, contract_path: impl Into<String>) -> Self {
        let contract_path = contract_path.into();
        Self {
            name: format!("ad-hoc {}", contract_path),
            rpc_url,
            chain_id,
            contract_path,
            constructor_args: vec![],
        }
    }
}

fn deserialize_chain_id<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ChainId {
        Number(u64),
        Text(String),
    }

    match ChainId::deserialize(deserializer)? {
        ChainId::Number(id) => Ok(id),
        ChainId::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Load the list of deployment profiles from a JSON file.
///
/// The file must contain a non-empty JSON array of profile objects.
pub fn load_profiles(path: &Path) -> Result<Vec<DeploymentProfile>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile file {}", path.display()))?;
    let profiles = parse_profiles(&content)
        .with_context(|| format!("Failed to parse profile file {}", path.display()))?;

    tracing::debug!(path = %path.display(), count = profiles.len(), "Profiles loaded");
    Ok(profiles)
}

/// Parse a profile list from JSON text.
pub fn parse_profiles(content: &str) -> Result<Vec<DeploymentProfile>> {
    let profiles: Vec<DeploymentProfile> =
        serde_json::from_str(content).context("Profile file is not a valid profile list")?;

    if profiles.is_empty() {
        anyhow::bail!("Profile file does not declare any profile");
    }

    Ok(profiles)
}

/// Ordered set of private keys, one deployment attempt per key.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PrivateKeySet(Vec<String>);

impl PrivateKeySet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

// Keys must never end up in logs.
impl fmt::Debug for PrivateKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeySet")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Parse a key file body: one key per line, whitespace trimmed, blank lines dropped.
pub fn parse_private_keys(content: &str) -> PrivateKeySet {
    PrivateKeySet(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect(),
    )
}

/// Read the key file.
///
/// A missing file yields an empty set; the round reports it as having no keys.
pub fn load_private_keys(path: &Path) -> Result<PrivateKeySet> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Key file not found");
        return Ok(PrivateKeySet::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file {}", path.display()))?;

    Ok(parse_private_keys(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILES: &str = r#"[
        {
            "name": "Sepolia token",
            "RPC_URL": "https://ethereum-sepolia-rpc.publicnode.com",
            "CHAIN_ID": 11155111,
            "CONTRACT_PATH": "contracts/Token.sol",
            "CONSTRUCTOR_ARGS": ["My Token", "MTK", 1000000]
        },
        {
            "name": "Local counter",
            "RPC_URL": "http://127.0.0.1:8545",
            "CHAIN_ID": "31337",
            "CONTRACT_PATH": "contracts/Counter.sol"
        }
    ]"#;

    #[test]
    fn test_parse_profiles() {
        let profiles = parse_profiles(PROFILES).unwrap();
        assert_eq!(profiles.len(), 2);

        assert_eq!(profiles[0].name, "Sepolia token");
        assert_eq!(profiles[0].chain_id, 11155111);
        assert_eq!(profiles[0].contract_path, "contracts/Token.sol");
        assert_eq!(profiles[0].constructor_args.len(), 3);
        assert_eq!(profiles[0].constructor_args[2], serde_json::json!(1000000));

        assert_eq!(profiles[1].chain_id, 31337);
        assert_eq!(profiles[1].rpc_url.as_str(), "http://127.0.0.1:8545/");
        assert!(profiles[1].constructor_args.is_empty());
    }

    #[test]
    fn test_parse_profiles_rejects_malformed() {
        assert!(parse_profiles("").is_err());
        assert!(parse_profiles("{}").is_err());
        assert!(parse_profiles("[]").is_err());
        // Missing CONTRACT_PATH
        assert!(
            parse_profiles(r#"[{"name": "x", "RPC_URL": "http://localhost:8545", "CHAIN_ID": 1}]"#)
                .is_err()
        );
        // Non-numeric chain id
        assert!(parse_profiles(
            r#"[{"name": "x", "RPC_URL": "http://localhost:8545", "CHAIN_ID": "main", "CONTRACT_PATH": "a.sol"}]"#
        )
        .is_err());
    }

    #[test]
    fn test_load_profiles_missing_file() {
        let dir = tempdir::TempDir::new("soldeploy-config").unwrap();
        assert!(load_profiles(&dir.path().join("config.json")).is_err());
    }

    #[test]
    fn test_load_profiles_from_file() {
        let dir = tempdir::TempDir::new("soldeploy-config").unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, PROFILES).unwrap();

        let profiles = load_profiles(&path).unwrap();
        assert_eq!(profiles[1].name, "Local counter");
    }

    #[test]
    fn test_parse_private_keys_drops_blank_lines() {
        let keys = parse_private_keys("\n  0xaaa  \n\n\t\n0xbbb\r\n   \n0xccc");
        assert_eq!(keys.len(), 3);
        assert_eq!(keys.iter().collect::<Vec<_>>(), vec!["0xaaa", "0xbbb", "0xccc"]);
    }

    #[test]
    fn test_parse_private_keys_empty() {
        assert!(parse_private_keys("").is_empty());
        assert!(parse_private_keys("\n \n\t\n").is_empty());
    }

    #[test]
    fn test_load_private_keys_missing_file_is_empty() {
        let dir = tempdir::TempDir::new("soldeploy-keys").unwrap();
        let keys = load_private_keys(&dir.path().join("keys.txt")).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_private_key_set_debug_is_redacted() {
        let keys = parse_private_keys("0xdeadbeef\n0xcafebabe");
        let debug = format!("{:?}", keys);
        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("len: 2"));
    }
}
