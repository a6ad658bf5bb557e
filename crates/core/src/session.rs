//! The two interactive front ends.
//!
//! Both gather a [`DeploymentProfile`] their own way and feed the shared executor:
//! - profile-driven mode picks a profile from the profile file and deploys once per
//!   key, round after round, until no key is left or a shutdown is requested;
//! - ad-hoc mode asks for every connection parameter and deploys a fixed number of
//!   contracts with a single key, then returns.

use std::path::PathBuf;

use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use url::Url;

use crate::{
    ArtifactCache, CompiledArtifact, ContractCompiler, ContractDeployer, DeploymentProfile,
    ResultLog, RoundOutcome, Settings,
    config::{load_private_keys, load_profiles},
    console::Console,
    constructor::{constructor_inputs, init_code, json_args_to_text, split_argument_line},
    executor::{parse_signer, run_key_round, run_repeated_signer},
    schedule::{Round, RoundScheduler, SchedulerExit, ShutdownSignal},
};

/// Prompt shown before reading the menu choice.
const MENU_PROMPT: &str = "Enter the number of the profile to use: ";
/// Prompt shown before each ad-hoc deployment of a contract whose constructor takes parameters.
const ARGS_PROMPT: &str = "Enter constructor arguments (comma-separated, or leave blank if none): ";

/// How an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The operator chose to exit from the menu.
    UserExit,
    /// Ad-hoc mode deployed every requested contract.
    Completed,
    /// Profile-driven mode was stopped by a shutdown request.
    Shutdown,
    /// A profile-driven round found no private key.
    NoKeys,
}

impl SessionExit {
    /// Whether the process should exit successfully.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::NoKeys)
    }
}

/// A validated menu answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Exit,
    /// 0-based index into the profile list.
    Profile(usize),
}

/// Parse a menu answer for a menu of `profile_count` entries (1-based, `0` exits).
pub fn parse_menu_choice(input: &str, profile_count: usize) -> Result<MenuChoice> {
    let choice: usize = input
        .trim()
        .parse()
        .with_context(|| format!("Invalid choice '{}'", input.trim()))?;

    match choice {
        0 => Ok(MenuChoice::Exit),
        n if n <= profile_count => Ok(MenuChoice::Profile(n - 1)),
        n => anyhow::bail!("Invalid choice {}: pick a number between 0 and {}", n, profile_count),
    }
}

/// Show the profile menu and read the operator's choice.
pub fn select_profile<C: Console>(
    console: &mut C,
    profiles: &[DeploymentProfile],
) -> Result<MenuChoice> {
    console.say("");
    console.say("Available profiles:");
    for (index, profile) in profiles.iter().enumerate() {
        console.say(&format!("{}. {}", index + 1, profile.name));
    }
    console.say("0. Exit");

    let answer = console.ask(MENU_PROMPT)?;
    parse_menu_choice(&answer, profiles.len())
}

/// One profile-driven round: reload keys, (re)compile if the source changed, deploy, record.
struct ProfileRound<'a, C, D> {
    profile: &'a DeploymentProfile,
    args: Vec<String>,
    cache: ArtifactCache<C>,
    deployer: D,
    key_file: PathBuf,
    results: ResultLog,
}

impl<C: ContractCompiler, D: ContractDeployer> Round for ProfileRound<'_, C, D> {
    async fn run(&mut self, round: u64) -> Result<RoundOutcome> {
        let keys = load_private_keys(&self.key_file)?;
        if keys.is_empty() {
            tracing::error!(key_file = %self.key_file.display(), "No private key found");
            return Ok(RoundOutcome::NoKeys);
        }

        tracing::info!(
            round,
            accounts = keys.len(),
            profile = %self.profile.name,
            "Starting deployment round..."
        );

        let artifact = self
            .cache
            .artifact_for_file(&self.profile.contract_path)
            .await?;
        let code = init_code(&artifact, &self.args)?;

        let outcome = run_key_round(&self.deployer, &code, &keys).await;

        if let RoundOutcome::Completed(report) = &outcome {
            self.results
                .append(self.profile.chain_id, &report.addresses())?;
            tracing::info!(
                round,
                deployed = report.deployed.len(),
                failed = report.failures.len(),
                "All deployments of the round complete"
            );
        }

        Ok(outcome)
    }
}

/// Profile-driven mode.
///
/// `deployer_for` builds the deployer of the selected profile from the fixed gas limit.
pub async fn run_profile_mode<Con, C, D, F>(
    console: &mut Con,
    settings: &Settings,
    compiler: C,
    deployer_for: F,
    shutdown: ShutdownSignal,
) -> Result<SessionExit>
where
    Con: Console,
    C: ContractCompiler,
    D: ContractDeployer,
    F: FnOnce(&DeploymentProfile, Option<u64>) -> D,
{
    let profiles = load_profiles(&settings.config_file)?;

    let profile = match select_profile(console, &profiles)? {
        MenuChoice::Exit => {
            console.say("Exiting...");
            return Ok(SessionExit::UserExit);
        }
        MenuChoice::Profile(index) => &profiles[index],
    };

    tracing::info!(
        profile = %profile.name,
        chain_id = profile.chain_id,
        contract = %profile.contract_path,
        "Profile selected"
    );

    let args = json_args_to_text(&profile.constructor_args)
        .with_context(|| format!("Invalid constructor arguments in profile '{}'", profile.name))?;
    let mut cache = ArtifactCache::new(compiler);

    // Source, compiler and constructor argument problems are fatal before the first round.
    let artifact = cache.artifact_for_file(&profile.contract_path).await?;
    init_code(&artifact, &args)
        .with_context(|| format!("Invalid constructor arguments in profile '{}'", profile.name))?;

    let mut round = ProfileRound {
        profile,
        args,
        cache,
        deployer: deployer_for(profile, Some(settings.gas_limit)),
        key_file: settings.key_file.clone(),
        results: ResultLog::new(&settings.result_file),
    };

    let mut scheduler = RoundScheduler::new(settings.round_interval(), shutdown);
    match scheduler.run(&mut round).await? {
        SchedulerExit::NoKeys => {
            console.say("Deployment failed. Check your configuration and private keys.");
            Ok(SessionExit::NoKeys)
        }
        SchedulerExit::Shutdown => Ok(SessionExit::Shutdown),
    }
}

/// Connection parameters typed in ad-hoc mode.
#[derive(Debug, Clone)]
pub struct AdHocParams {
    pub profile: DeploymentProfile,
    pub signer: PrivateKeySigner,
}

fn ask_required<C: Console>(console: &mut C, prompt: &str, secret: bool) -> Result<String> {
    let answer = if secret {
        console.ask_secret(prompt)?
    } else {
        console.ask(prompt)?
    };

    let answer = answer.trim().to_string();
    if answer.is_empty() {
        anyhow::bail!("Missing required input: {}", prompt.trim_end_matches([' ', ':']));
    }

    Ok(answer)
}

/// Ask for RPC URL, private key, chain id and contract path.
///
/// Every answer is required and validated before anything else happens.
pub fn gather_adhoc_params<C: Console>(console: &mut C) -> Result<AdHocParams> {
    let rpc_url = ask_required(console, "Enter RPC URL: ", false)?;
    let private_key = ask_required(console, "Enter Private Key: ", true)?;
    let chain_id = ask_required(console, "Enter Chain ID: ", false)?;
    let contract_path = ask_required(console, "Enter contract source file path: ", false)?;

    let rpc_url: Url = rpc_url
        .parse()
        .with_context(|| format!("Invalid RPC URL '{}'", rpc_url))?;
    let chain_id: u64 = chain_id
        .parse()
        .with_context(|| format!("Invalid chain id '{}'", chain_id))?;
    let signer = parse_signer(&private_key)?;

    Ok(AdHocParams {
        profile: DeploymentProfile::ad_hoc(rpc_url, chain_id, contract_path),
        signer,
    })
}

/// Ask how many contracts to deploy. Only positive integers are accepted.
pub fn ask_deployment_count<C: Console>(console: &mut C) -> Result<usize> {
    let answer = console.ask("Enter number of deployments: ")?;

    match answer.trim().parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => anyhow::bail!(
            "Invalid number '{}': please enter a positive number",
            answer.trim()
        ),
    }
}

/// Creation payload for one ad-hoc deployment, prompting for constructor arguments if needed.
fn adhoc_payload<C: Console>(
    console: &mut C,
    artifact: &CompiledArtifact,
    needs_args: bool,
) -> Result<alloy_core::primitives::Bytes> {
    if !needs_args {
        return Ok(artifact.bytecode.clone());
    }

    let line = console.ask(ARGS_PROMPT)?;
    init_code(artifact, &split_argument_line(&line))
}

/// Ad-hoc mode.
///
/// `deployer_for` builds the deployer for the typed-in connection parameters; no gas
/// limit is imposed so the provider estimates it.
pub async fn run_adhoc_mode<Con, C, D, F>(
    console: &mut Con,
    settings: &Settings,
    compiler: C,
    deployer_for: F,
) -> Result<SessionExit>
where
    Con: Console,
    C: ContractCompiler,
    D: ContractDeployer,
    F: FnOnce(&DeploymentProfile, Option<u64>) -> D,
{
    let AdHocParams { profile, signer } = gather_adhoc_params(console)?;
    let count = ask_deployment_count(console)?;

    console.say(&format!("Deploying {} contracts...", count));

    let artifact = ArtifactCache::new(compiler)
        .artifact_for_file(&profile.contract_path)
        .await?;
    let needs_args = !constructor_inputs(&artifact.abi).is_empty();
    let deployer = deployer_for(&profile, None);

    let report = run_repeated_signer(&deployer, &signer, count, |_| {
        adhoc_payload(console, &artifact, needs_args)
    })
    .await;

    ResultLog::new(&settings.result_file).append(profile.chain_id, &report.addresses())?;

    console.say(&format!(
        "All deployments complete: {} deployed, {} failed",
        report.deployed.len(),
        report.failures.len()
    ));

    Ok(SessionExit::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ScriptedConsole;

    fn profiles() -> Vec<DeploymentProfile> {
        ["Sepolia", "Holesky"]
            .into_iter()
            .map(|name| DeploymentProfile {
                name: name.to_string(),
                rpc_url: "http://127.0.0.1:8545".parse().unwrap(),
                chain_id: 31337,
                contract_path: "Counter.sol".to_string(),
                constructor_args: vec![],
            })
            .collect()
    }

    #[test]
    fn test_parse_menu_choice() {
        assert_eq!(parse_menu_choice("0", 2).unwrap(), MenuChoice::Exit);
        assert_eq!(parse_menu_choice("1", 2).unwrap(), MenuChoice::Profile(0));
        assert_eq!(parse_menu_choice(" 2 \n", 2).unwrap(), MenuChoice::Profile(1));
    }

    #[test]
    fn test_parse_menu_choice_rejects_invalid() {
        assert!(parse_menu_choice("3", 2).is_err());
        assert!(parse_menu_choice("-1", 2).is_err());
        assert!(parse_menu_choice("one", 2).is_err());
        assert!(parse_menu_choice("", 2).is_err());
    }

    #[test]
    fn test_select_profile_lists_menu() {
        let mut console = ScriptedConsole::new(["2"]);
        let choice = select_profile(&mut console, &profiles()).unwrap();

        assert_eq!(choice, MenuChoice::Profile(1));
        assert!(console.transcript.contains(&"1. Sepolia".to_string()));
        assert!(console.transcript.contains(&"2. Holesky".to_string()));
        assert!(console.transcript.contains(&"0. Exit".to_string()));
    }

    #[test]
    fn test_gather_adhoc_params() {
        let mut console = ScriptedConsole::new([
            "http://127.0.0.1:8545",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            "31337",
            "contracts/Counter.sol",
        ]);

        let params = gather_adhoc_params(&mut console).unwrap();
        assert_eq!(params.profile.chain_id, 31337);
        assert_eq!(params.profile.contract_path, "contracts/Counter.sol");
        assert!(params.profile.constructor_args.is_empty());
        assert_eq!(
            params.signer.address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_gather_adhoc_params_rejects_missing_or_invalid_input() {
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

        let mut console = ScriptedConsole::new(["http://127.0.0.1:8545", key, "", "a.sol"]);
        let err = gather_adhoc_params(&mut console).unwrap_err();
        assert!(err.to_string().contains("Missing required input"));

        let mut console = ScriptedConsole::new(["http://127.0.0.1:8545", key, "mainnet", "a.sol"]);
        assert!(gather_adhoc_params(&mut console).is_err());

        let mut console = ScriptedConsole::new(["not a url", key, "1", "a.sol"]);
        assert!(gather_adhoc_params(&mut console).is_err());

        let mut console = ScriptedConsole::new(["http://127.0.0.1:8545", "0x1234", "1", "a.sol"]);
        assert!(gather_adhoc_params(&mut console).is_err());
    }

    #[test]
    fn test_ask_deployment_count() {
        assert_eq!(ask_deployment_count(&mut ScriptedConsole::new(["3"])).unwrap(), 3);
        assert!(ask_deployment_count(&mut ScriptedConsole::new(["0"])).is_err());
        assert!(ask_deployment_count(&mut ScriptedConsole::new(["-2"])).is_err());
        assert!(ask_deployment_count(&mut ScriptedConsole::new(["many"])).is_err());
    }

    #[test]
    fn test_session_exit_status() {
        assert!(SessionExit::UserExit.is_success());
        assert!(SessionExit::Completed.is_success());
        assert!(SessionExit::Shutdown.is_success());
        assert!(!SessionExit::NoKeys.is_success());
    }
}
