//! Append-only log of deployed contract addresses.

use std::{
    io::Write,
    path::PathBuf,
};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};

/// Key prefix of every result line.
pub const RESULT_KEY_PREFIX: &str = "DEPLOYED_CONTRACTS_";

/// Format one result line (without line terminator).
pub fn format_result_line(chain_id: u64, addresses: &[Address]) -> String {
    let joined = addresses
        .iter()
        .map(|address| address.to_checksum(None))
        .collect::<Vec<_>>()
        .join(",");

    format!("{}{}={}", RESULT_KEY_PREFIX, chain_id, joined)
}

/// The result file. Lines are only ever appended.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append the line for one round, creating the file if needed.
    pub fn append(&self, chain_id: u64, addresses: &[Address]) -> Result<()> {
        let line = format_result_line(chain_id, addresses);

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open result file {}", self.path.display()))?;

        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write result file {}", self.path.display()))?;

        tracing::info!(path = %self.path.display(), count = addresses.len(), "Results recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy_core::primitives::address;

    use super::*;

    const FIRST: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
    const SECOND: Address = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");

    #[test]
    fn test_format_result_line() {
        assert_eq!(
            format_result_line(11155111, &[FIRST, SECOND]),
            "DEPLOYED_CONTRACTS_11155111=0x5FbDB2315678afecb367f032d93F642f64180aa3,0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
        );
        assert_eq!(format_result_line(1, &[]), "DEPLOYED_CONTRACTS_1=");
    }

    #[test]
    fn test_append_never_rewrites() {
        let dir = tempdir::TempDir::new("soldeploy-results").unwrap();
        let path = dir.path().join("results.txt");
        let log = ResultLog::new(&path);

        log.append(31337, &[FIRST]).unwrap();
        log.append(31337, &[FIRST]).unwrap();
        log.append(10, &[SECOND, FIRST]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "DEPLOYED_CONTRACTS_31337=0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "DEPLOYED_CONTRACTS_31337=0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "DEPLOYED_CONTRACTS_10=0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512,0x5FbDB2315678afecb367f032d93F642f64180aa3",
            ]
        );
    }

    #[test]
    fn test_append_keeps_existing_content() {
        let dir = tempdir::TempDir::new("soldeploy-results").unwrap();
        let path = dir.path().join("results.txt");
        std::fs::write(&path, "existing line\n").unwrap();

        ResultLog::new(&path).append(1, &[]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "existing line\nDEPLOYED_CONTRACTS_1=\n");
    }
}
