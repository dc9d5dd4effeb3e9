//! CLI commands.

mod config;
mod delete;
mod list;
mod sweep;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rigger_api::{Client, ClientConfig, Principal};

use crate::config::{Config, Credentials};
use crate::error::CliError;
use crate::output::OutputFormat;

/// rigctl - inspect test resources and retry failed teardowns.
#[derive(Debug, Parser)]
#[command(name = "rigctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Management API endpoint, overriding the saved config.
    #[arg(long, global = true, env = "RIGGER_API_URL")]
    endpoint: Option<String>,

    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show or change saved configuration.
    Config(config::ConfigCommand),

    /// List resources of one kind.
    List(list::ListCommand),

    /// Delete one resource by `kind:id`.
    Delete(delete::DeleteCommand),

    /// Retry the failed entries of a saved teardown report.
    Sweep(sweep::SweepCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;
        if let Some(endpoint) = self.endpoint {
            config.api_url = endpoint;
        }

        let ctx = CommandContext {
            config,
            credentials: Credentials::load()?,
            format: self.format,
        };

        match self.command {
            Commands::Config(cmd) => cmd.run(ctx).await,
            Commands::List(cmd) => cmd.run(ctx).await,
            Commands::Delete(cmd) => cmd.run(ctx).await,
            Commands::Sweep(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("rigctl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: Config,
    pub credentials: Option<Credentials>,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Keys from the environment win over the saved credentials.
    fn principal(&self) -> Result<Principal, CliError> {
        let from_env = (
            std::env::var("RIGGER_API_KEY").ok(),
            std::env::var("RIGGER_SECRET_KEY").ok(),
        );
        match (from_env, &self.credentials) {
            ((Some(key), Some(secret)), _) => Ok(Principal::new(key, secret)),
            (_, Some(creds)) => Ok(creds.principal()),
            _ => Err(CliError::MissingCredentials),
        }
    }

    /// Get a signed API client.
    pub fn client(&self) -> Result<Client> {
        let config = ClientConfig::new(&self.config.api_url, self.principal()?)
            .map_err(CliError::from)?;
        Ok(Client::new(config).map_err(CliError::from)?)
    }
}
