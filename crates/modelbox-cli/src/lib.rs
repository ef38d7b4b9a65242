//! The `modelbox` command-line entry point: `server {init-config,
//! create-schema,start}` boots an agent from a config file, `client {...}`
//! talks to the same capability traits in-process (see `client`'s module
//! doc for why there's no wire hop).

pub mod agent;
pub mod cli;
pub mod client;
pub mod wiring;

use std::path::Path;

use clap::Parser;

use cli::{Cli, Command, ServerCommand};

pub fn load_config(path: &Path) -> anyhow::Result<modelbox_core::ServerConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("unable to read config {}: {e}", path.display()))?;
    toml::from_str(&text).map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))
}

/// Parses `argv`, runs the requested command to completion, and returns
/// the process exit code. Building the tokio runtime here (rather than
/// `#[tokio::main]` on a public `run`) keeps this crate usable as a
/// library from a caller that already owns a runtime.
pub fn run() -> std::process::ExitCode {
    env_logger::init();
    modelbox_persistence::init_dotenv();

    let cli = Cli::parse();
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("unable to start tokio runtime: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli.command)) {
        Ok(code) => std::process::ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Command) -> anyhow::Result<i32> {
    match command {
        Command::Server { command } => match command {
            ServerCommand::InitConfig { out } => {
                let config = modelbox_core::ServerConfig::default();
                let text = toml::to_string_pretty(&config)?;
                std::fs::write(&out, text)?;
                println!("wrote default config to {}", out.display());
                Ok(0)
            }
            ServerCommand::CreateSchema { config } => {
                let config = load_config(&config)?;
                let store = wiring::build_metadata_store(&config)?;
                wiring::create_schema(&store).await?;
                println!("schema applied to {:?} backend", config.metadata_storage);
                Ok(0)
            }
            ServerCommand::Start { config } => {
                let config = load_config(&config)?;
                let agent = agent::Agent::new(&config).await?;
                Ok(agent.start_and_block().await)
            }
        },
        Command::Client { config, command } => {
            client::run(config, command).await?;
            Ok(0)
        }
    }
}
