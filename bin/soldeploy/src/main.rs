//! soldeploy is a CLI tool to compile a Solidity contract and deploy it, once per
//! private key or a fixed number of times, to any EVM chain.

mod cli;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Mode};
use soldeploy_core::{
    SessionExit, Settings, SolcCompiler, Terminal, rpc_deployer, run_adhoc_mode,
    run_profile_mode, shutdown_channel,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Settings and secrets may live in a local .env file.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Environment loaded from file");
    }

    match run(cli).await {
        Ok(exit) if exit.is_success() => ExitCode::SUCCESS,
        Ok(exit) => {
            tracing::error!(?exit, "Stopped");
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!("{:#}", err);
            // Also reported when logging is turned off.
            eprintln!("{}", error_report(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<SessionExit> {
    let mut settings = Settings::load(&cli.settings)?;
    cli.apply_overrides(&mut settings);

    let mode = cli.mode();
    tracing::info!(
        %mode,
        config_file = %settings.config_file.display(),
        key_file = %settings.key_file.display(),
        result_file = %settings.result_file.display(),
        "Starting soldeploy..."
    );

    let compiler = SolcCompiler::new(settings.solc.clone());
    let mut console = Terminal;

    match mode {
        Mode::Profile => {
            let (trigger, signal) = shutdown_channel();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                tracing::info!("Received Ctrl+C, stopping after the current round...");
                trigger.fire();

                // Prompts block on stdin and never observe the shutdown.
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Received Ctrl+C again, exiting now");
                    std::process::exit(130);
                }
            });

            run_profile_mode(&mut console, &settings, compiler, rpc_deployer, signal).await
        }
        Mode::Adhoc => run_adhoc_mode(&mut console, &settings, compiler, rpc_deployer).await,
    }
}

/// One-line report of a fatal error with its whole context chain.
fn error_report(err: &anyhow::Error) -> String {
    format!("Error: {:#}", err)
}
