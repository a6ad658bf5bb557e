//! Solidity compilation through the `solc` standard-JSON interface.

use std::{collections::BTreeMap, future::Future, path::PathBuf, process::Stdio};

use alloy_core::{json_abi::JsonAbi, primitives::Bytes};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

/// Output requested from the compiler for every contract of every source.
const OUTPUT_SELECTION: [&str; 2] = ["abi", "evm.bytecode"];

/// A compiled contract ready to be deployed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledArtifact {
    pub contract_name: String,
    pub abi: JsonAbi,
    /// Creation bytecode.
    pub bytecode: Bytes,
}

impl CompiledArtifact {
    /// The creation bytecode as a lowercase hex string, without `0x` prefix.
    pub fn bytecode_hex(&self) -> String {
        hex::encode(&self.bytecode)
    }
}

/// Something able to turn Solidity source text into a [`CompiledArtifact`].
pub trait ContractCompiler {
    /// Compile `source`, registered under the logical `path`, and return its first contract.
    fn compile(
        &self,
        source: &str,
        path: &str,
    ) -> impl Future<Output = Result<CompiledArtifact>> + Send;
}

#[derive(Debug, Serialize)]
struct StandardJsonInput<'a> {
    language: &'static str,
    sources: BTreeMap<&'a str, SourceEntry<'a>>,
    settings: InputSettings,
}

#[derive(Debug, Serialize)]
struct SourceEntry<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InputSettings {
    output_selection: BTreeMap<&'static str, BTreeMap<&'static str, Vec<&'static str>>>,
}

impl<'a> StandardJsonInput<'a> {
    fn new(path: &'a str, source: &'a str) -> Self {
        let selection = BTreeMap::from([("*", OUTPUT_SELECTION.to_vec())]);

        Self {
            language: "Solidity",
            sources: BTreeMap::from([(path, SourceEntry { content: source })]),
            settings: InputSettings {
                output_selection: BTreeMap::from([("*", selection)]),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct StandardJsonOutput {
    #[serde(default)]
    errors: Vec<Diagnostic>,
    /// `{ <source path>: { <contract name>: <contract output> } }`, in compiler order.
    #[serde(default)]
    contracts: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Diagnostic {
    severity: String,
    message: String,
    formatted_message: Option<String>,
}

impl Diagnostic {
    fn is_error(&self) -> bool {
        self.severity.eq_ignore_ascii_case("error")
    }

    fn text(&self) -> &str {
        self.formatted_message.as_deref().unwrap_or(&self.message)
    }
}

#[derive(Debug, Deserialize)]
struct ContractOutput {
    abi: JsonAbi,
    evm: EvmOutput,
}

#[derive(Debug, Deserialize)]
struct EvmOutput {
    bytecode: BytecodeOutput,
}

#[derive(Debug, Deserialize)]
struct BytecodeOutput {
    object: String,
}

/// Parse the compiler's standard-JSON output and extract the first contract of `path`.
pub fn parse_compiler_output(output: &[u8], path: &str) -> Result<CompiledArtifact> {
    let output: StandardJsonOutput =
        serde_json::from_slice(output).context("Failed to parse compiler output")?;

    let (errors, warnings): (Vec<_>, Vec<_>) =
        output.errors.iter().partition(|diag| diag.is_error());

    for warning in warnings {
        tracing::warn!(severity = %warning.severity, "{}", warning.text().trim_end());
    }

    if !errors.is_empty() {
        let messages = errors
            .iter()
            .map(|diag| diag.text().trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        anyhow::bail!("Compilation failed:\n{}", messages);
    }

    let (contract_name, contract) = output
        .contracts
        .get(path)
        .and_then(Value::as_object)
        .and_then(|contracts| contracts.iter().next())
        .with_context(|| format!("No contract found in compiler output for {}", path))?;

    let contract: ContractOutput = serde_json::from_value(contract.clone())
        .with_context(|| format!("Malformed compiler output for contract {}", contract_name))?;

    let object = contract.evm.bytecode.object.trim_start_matches("0x");
    if object.is_empty() {
        anyhow::bail!(
            "Contract {} has no creation bytecode (abstract contract or interface?)",
            contract_name
        );
    }
    if object.contains("__$") {
        anyhow::bail!(
            "Contract {} links external libraries, which is not supported",
            contract_name
        );
    }

    let bytecode = hex::decode(object)
        .with_context(|| format!("Invalid bytecode for contract {}", contract_name))?;

    Ok(CompiledArtifact {
        contract_name: contract_name.clone(),
        abi: contract.abi,
        bytecode: bytecode.into(),
    })
}

/// Compiler backed by a local `solc` binary invoked with `--standard-json`.
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    solc: PathBuf,
}

impl SolcCompiler {
    pub fn new(solc: impl Into<PathBuf>) -> Self {
        Self { solc: solc.into() }
    }
}

impl ContractCompiler for SolcCompiler {
    async fn compile(&self, source: &str, path: &str) -> Result<CompiledArtifact> {
        let input = serde_json::to_vec(&StandardJsonInput::new(path, source))
            .context("Failed to serialize compiler input")?;

        tracing::info!(path, solc = %self.solc.display(), "Compiling contract...");

        let mut child = tokio::process::Command::new(&self.solc)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| {
                format!(
                    "Failed to run {}. Is solc installed and on the PATH?",
                    self.solc.display()
                )
            })?;

        let mut stdin = child.stdin.take().context("Failed to open solc stdin")?;
        stdin
            .write_all(&input)
            .await
            .context("Failed to write compiler input")?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .context("Failed to wait for solc")?;

        if !output.status.success() {
            anyhow::bail!(
                "solc exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let artifact = parse_compiler_output(&output.stdout, path)?;
        tracing::info!(
            contract = %artifact.contract_name,
            bytecode_len = artifact.bytecode.len(),
            "Contract compiled"
        );
        Ok(artifact)
    }
}

/// Read a contract source file.
pub fn load_contract_source(path: &str) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read contract source {}", path))
}

/// SHA-256 of a source text, hex encoded.
pub fn source_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}

/// Memoizes the last compiled artifact, keyed by the hash of its source text.
///
/// Rounds re-read the source every time; unchanged text reuses the previous artifact.
#[derive(Debug)]
pub struct ArtifactCache<C> {
    compiler: C,
    last: Option<(String, CompiledArtifact)>,
}

impl<C: ContractCompiler> ArtifactCache<C> {
    pub fn new(compiler: C) -> Self {
        Self {
            compiler,
            last: None,
        }
    }

    /// Return the artifact for `source`, compiling only if the text changed.
    pub async fn artifact(&mut self, source: &str, path: &str) -> Result<CompiledArtifact> {
        let hash = source_hash(source);

        if let Some((cached_hash, artifact)) = &self.last {
            if *cached_hash == hash {
                tracing::debug!(path, hash, "Source unchanged, reusing compiled artifact");
                return Ok(artifact.clone());
            }
        }

        let artifact = self.compiler.compile(source, path).await?;
        self.last = Some((hash, artifact.clone()));
        Ok(artifact)
    }

    /// Read `path` from disk and return its artifact.
    pub async fn artifact_for_file(&mut self, path: &str) -> Result<CompiledArtifact> {
        let source = load_contract_source(path)?;
        self.artifact(&source, path).await
    }
}
