//! Config commands (endpoint and keys).

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::config::Credentials;
use crate::output::{print_json, print_success, OutputFormat};

use super::CommandContext;

/// Show or change saved configuration.
#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
enum ConfigSubcommand {
    /// Show the effective configuration.
    Show,

    /// Save the management API endpoint.
    SetEndpoint {
        /// Endpoint URL, e.g. http://mgmt:8080/client/api.
        url: String,
    },

    /// Save the API key pair.
    SetKeys {
        api_key: String,
        secret_key: String,
    },
}

#[derive(Debug, Serialize)]
struct ConfigView {
    api_url: String,
    api_key: Option<String>,
}

impl ConfigCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ConfigSubcommand::Show => show(ctx),
            ConfigSubcommand::SetEndpoint { url } => set_endpoint(ctx, url),
            ConfigSubcommand::SetKeys {
                api_key,
                secret_key,
            } => set_keys(ctx, api_key, secret_key),
        }
    }
}

fn show(ctx: CommandContext) -> Result<()> {
    let view = ConfigView {
        api_url: ctx.config.api_url.clone(),
        api_key: ctx.credentials.as_ref().map(|c| c.api_key.clone()),
    };

    match ctx.format {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Table => {
            println!("api_url: {}", view.api_url);
            println!("api_key: {}", view.api_key.as_deref().unwrap_or("-"));
        }
    }
    Ok(())
}

fn set_endpoint(mut ctx: CommandContext, url: String) -> Result<()> {
    url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid endpoint '{url}': {e}"))?;
    ctx.config.api_url = url;
    let path = ctx.config.save()?;

    match ctx.format {
        OutputFormat::Json => print_json(&serde_json::json!({ "ok": true })),
        OutputFormat::Table => print_success(&format!("Saved endpoint to {}", path.display())),
    }
    Ok(())
}

fn set_keys(ctx: CommandContext, api_key: String, secret_key: String) -> Result<()> {
    let path = Credentials::new(api_key, secret_key).save()?;

    match ctx.format {
        OutputFormat::Json => print_json(&serde_json::json!({ "ok": true })),
        OutputFormat::Table => print_success(&format!("Saved keys to {}", path.display())),
    }
    Ok(())
}
